/// Runtime settings the host page may override when constructing the app.
///
/// Every field is optional on the JS side; missing ones take the defaults below.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainerConfig {
    /// Key under which the whole progress map is stored.
    pub storage_key: String,
    /// BCP 47 tag handed to the speech engine.
    pub speech_locale: String,
    pub speech_rate: f32,
    /// Period of the review-center countdown refresh.
    pub countdown_tick_ms: u32,
}

pub const DEFAULT_STORAGE_KEY: &str = "jumla.progress";

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            speech_locale: "en-US".to_string(),
            // slower than normal speech so the learner can follow along
            speech_rate: 0.4,
            countdown_tick_ms: 1000,
        }
    }
}
