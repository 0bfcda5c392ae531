use std::cell::RefCell;
use std::sync::LazyLock;

use chrono::Utc;
use lesson_utils::Catalog;
use wasm_bindgen::prelude::*;

use crate::config::TrainerConfig;
use crate::navigation::{IntervalTimer, Screen};
use crate::schedule::{LessonStatus, StatusChange};
use crate::speech::BrowserSpeaker;
use crate::storage::LocalStorage;
use crate::trainer::Trainer;
use crate::utils;
use crate::views::{LessonOverview, LevelView, PracticeCard, PracticeStep, ReviewCenter};
use crate::writing::WritingFeedback;

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
#[allow(clippy::declare_interior_mutable_const)]
const LOGGER: LazyLock<()> = LazyLock::new(|| {
    utils::set_panic_hook();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The trainer as seen from the page. Every method handles one user interaction;
/// the page renders whatever comes back.
#[wasm_bindgen]
pub struct App {
    // wasm-bindgen types can't be generic, so the browser implementations are fixed here.
    // a borrow is never held across a call into JS
    trainer: RefCell<Trainer<LocalStorage, BrowserSpeaker, IntervalTimer>>,
}

#[wasm_bindgen]
impl App {
    /// `on_tick` is called every `countdownTickMs` while the review center shows a
    /// countdown. It should call `poll_statuses` and redraw if anything changed.
    ///
    /// Without `catalog_json` the built-in lesson library is used.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: TrainerConfig,
        catalog_json: Option<String>,
        on_tick: js_sys::Function,
    ) -> Result<App, JsValue> {
        // used to only initialize the logger once
        #[allow(clippy::borrow_interior_mutable_const)]
        *LOGGER;

        let catalog = match catalog_json {
            Some(json) => Catalog::from_json(&json),
            None => Catalog::builtin(),
        }
        .inspect_err(|e| log::error!("Error loading catalog: {e}"))
        .map_err(to_js)?;
        let store = LocalStorage::open()
            .inspect_err(|e| log::error!("Error opening storage: {e}"))
            .map_err(to_js)?;

        let trainer = Trainer::new(
            config,
            catalog,
            store,
            BrowserSpeaker::new(),
            IntervalTimer::new(on_tick),
            utils::shuffle_rng(),
        );
        Ok(Self {
            trainer: RefCell::new(trainer),
        })
    }

    pub fn screen(&self) -> Screen {
        self.trainer.borrow().screen()
    }

    pub fn previous_screen(&self) -> Screen {
        self.trainer.borrow().previous_screen()
    }

    pub fn show(&self, screen: Screen, from: Option<Screen>) {
        self.trainer.borrow_mut().show(screen, from, Utc::now());
    }

    pub fn back(&self) -> Screen {
        self.trainer.borrow_mut().back(Utc::now())
    }

    pub fn levels(&self) -> Vec<String> {
        self.trainer.borrow().levels()
    }

    pub fn select_level(&self, level_key: String) -> Result<LevelView, JsValue> {
        self.trainer
            .borrow_mut()
            .select_level(&level_key, Utc::now())
            .map_err(to_js)
    }

    pub fn open_lesson(&self, lesson_key: String) -> Result<LessonOverview, JsValue> {
        self.trainer
            .borrow_mut()
            .open_lesson(&lesson_key, Utc::now())
            .map_err(to_js)
    }

    pub fn lesson_overview(&self, lesson_key: String) -> Option<LessonOverview> {
        self.trainer.borrow().lesson_overview(&lesson_key)
    }

    pub fn lesson_status(&self, lesson_key: String) -> LessonStatus {
        self.trainer.borrow().lesson_status(&lesson_key, Utc::now())
    }

    pub fn review_center(&self) -> ReviewCenter {
        self.trainer.borrow().review_center(Utc::now())
    }

    pub fn open_review_center(&self) -> ReviewCenter {
        self.trainer.borrow_mut().open_review_center(Utc::now())
    }

    pub fn start_global_session(&self) -> Option<PracticeCard> {
        self.trainer.borrow_mut().start_global_session(Utc::now())
    }

    pub fn start_lesson_session(
        &self,
        lesson_key: String,
    ) -> Result<Option<PracticeCard>, JsValue> {
        self.trainer
            .borrow_mut()
            .start_lesson_session(&lesson_key, Utc::now())
            .map_err(to_js)
    }

    pub fn current_step(&self) -> Option<PracticeStep> {
        self.trainer.borrow().current_step()
    }

    pub fn record_repetition(&self) -> Result<Option<PracticeStep>, JsValue> {
        self.trainer
            .borrow_mut()
            .record_repetition(Utc::now())
            .map_err(to_js)
    }

    pub fn replay(&self) -> bool {
        self.trainer.borrow_mut().replay()
    }

    pub fn check_writing_answer(&self, answer: String) -> Result<WritingFeedback, JsValue> {
        self.trainer
            .borrow_mut()
            .check_writing_answer(&answer, Utc::now())
            .map_err(to_js)
    }

    pub fn skip_writing_exercise(&self) {
        self.trainer.borrow_mut().skip_writing_exercise(Utc::now());
    }

    pub fn poll_statuses(&self) -> Vec<StatusChange> {
        self.trainer.borrow_mut().poll_statuses(Utc::now())
    }
}
