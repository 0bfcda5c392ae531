/// Text to read aloud. Speech is fire-and-forget: nothing waits for it to finish and a
/// new request cuts off whatever is still playing.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub text: String,
    pub locale: String,
    pub rate: f32,
}

pub trait Speaker {
    fn speak(&mut self, request: &SpeechRequest);
}

/// Keeps every request instead of playing it. Used by native hosts and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingSpeaker {
    spoken: Vec<SpeechRequest>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> &[SpeechRequest] {
        &self.spoken
    }

    pub fn last(&self) -> Option<&SpeechRequest> {
        self.spoken.last()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, request: &SpeechRequest) {
        self.spoken.push(request.clone());
    }
}

/// Index of the voice to use given each available voice's language tag: an American or
/// British English voice if there is one, otherwise any English voice.
pub fn pick_voice<'a>(voice_langs: impl IntoIterator<Item = &'a str>) -> Option<usize> {
    let langs: Vec<&str> = voice_langs.into_iter().collect();

    langs
        .iter()
        .position(|lang| lang.starts_with("en-US") || lang.starts_with("en-GB"))
        .or_else(|| langs.iter().position(|lang| lang.starts_with("en-")))
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserSpeaker;

#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen::JsCast as _;
    use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance, SpeechSynthesisVoice};

    use super::{SpeechRequest, Speaker, pick_voice};

    /// `window.speechSynthesis`. Without it every request is dropped.
    pub struct BrowserSpeaker {
        synthesis: Option<SpeechSynthesis>,
    }

    impl BrowserSpeaker {
        pub fn new() -> Self {
            let synthesis = web_sys::window().and_then(|window| {
                window
                    .speech_synthesis()
                    .inspect_err(|e| log::warn!("Speech synthesis unavailable: {e:?}"))
                    .ok()
            });
            Self { synthesis }
        }

        fn preferred_voice(synthesis: &SpeechSynthesis) -> Option<SpeechSynthesisVoice> {
            // voices load asynchronously, so ask again on every request
            let voices: Vec<SpeechSynthesisVoice> = synthesis
                .get_voices()
                .iter()
                .filter_map(|voice| voice.dyn_into::<SpeechSynthesisVoice>().ok())
                .collect();
            let langs: Vec<String> = voices.iter().map(|voice| voice.lang()).collect();
            let index = pick_voice(langs.iter().map(String::as_str))?;
            voices.into_iter().nth(index)
        }
    }

    impl Default for BrowserSpeaker {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Speaker for BrowserSpeaker {
        fn speak(&mut self, request: &SpeechRequest) {
            let Some(synthesis) = &self.synthesis else {
                return;
            };
            synthesis.cancel();

            let utterance = match SpeechSynthesisUtterance::new_with_text(&request.text) {
                Ok(utterance) => utterance,
                Err(e) => {
                    log::error!("Failed to create utterance: {e:?}");
                    return;
                }
            };
            utterance.set_lang(&request.locale);
            utterance.set_rate(request.rate);
            utterance.set_voice(Self::preferred_voice(synthesis).as_ref());
            synthesis.speak(&utterance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_american_or_british_english() {
        assert_eq!(pick_voice(["fr-FR", "en-AU", "en-GB", "en-US"]), Some(2));
        assert_eq!(pick_voice(["en-US"]), Some(0));
    }

    #[test]
    fn falls_back_to_any_english_voice() {
        assert_eq!(pick_voice(["ar-SA", "en-IN"]), Some(1));
    }

    #[test]
    fn no_english_voice_means_default_voice() {
        assert_eq!(pick_voice(["ar-SA", "fr-FR"]), None);
        assert_eq!(pick_voice(Vec::<&str>::new()), None);
        // bare "en" without a region is not picked
        assert_eq!(pick_voice(["en"]), None);
    }
}
