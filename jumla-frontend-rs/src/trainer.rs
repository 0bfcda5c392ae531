//! The controller. It owns every piece of mutable state and handles one user
//! interaction at a time, so no interaction ever observes another half-applied.

use chrono::{DateTime, Utc};
use lesson_utils::{Catalog, CatalogError, StageTable};
use rand_chacha::ChaCha8Rng;

use crate::config::TrainerConfig;
use crate::navigation::{CountdownTimer, Navigator, Screen};
use crate::progress::{ProgressError, ProgressStore, RepetitionOutcome};
use crate::schedule::{LessonStatus, StatusChange, StatusPoller, lesson_status};
use crate::session::{PracticeItem, PracticeSession, QueueStep};
use crate::speech::{Speaker, SpeechRequest};
use crate::storage::{KeyValueStore, StorageError};
use crate::views::{LessonOverview, LevelView, PracticeCard, PracticeStep, ReviewCenter};
use crate::writing::{WritingExercise, WritingFeedback};

#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("level `{0}` is not in the catalog")]
    UnknownLevel(String),
    #[error("there is no writing exercise to answer")]
    NoWritingExercise,
}

pub struct Trainer<S, A, T> {
    config: TrainerConfig,
    catalog: Catalog,
    stages: StageTable,
    progress: ProgressStore,
    store: S,
    speaker: A,
    timer: T,
    rng: ChaCha8Rng,
    navigator: Navigator,
    poller: StatusPoller,
    session: Option<PracticeSession>,
    writing: Option<WritingExercise>,
}

impl<S: KeyValueStore, A: Speaker, T: CountdownTimer> Trainer<S, A, T> {
    /// Load saved progress from `store` and bring it in line with `catalog`.
    pub fn new(
        config: TrainerConfig,
        catalog: Catalog,
        store: S,
        speaker: A,
        timer: T,
        rng: ChaCha8Rng,
    ) -> Self {
        let stages = StageTable::default();
        let mut progress = ProgressStore::load(&store, &config.storage_key);
        let reconciled = progress.reconcile(&catalog, &stages);
        log::info!(
            "Loaded progress for {} lesson(s) against a catalog of {}",
            progress.len(),
            catalog.num_lessons()
        );

        let mut trainer = Self {
            config,
            catalog,
            stages,
            progress,
            store,
            speaker,
            timer,
            rng,
            navigator: Navigator::default(),
            poller: StatusPoller::default(),
            session: None,
            writing: None,
        };
        if reconciled > 0 {
            if let Err(e) = trainer.persist() {
                log::warn!("Reconciled progress not saved, retrying on the next change: {e}");
            }
        }
        trainer
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stages(&self) -> &StageTable {
        &self.stages
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn speaker(&self) -> &A {
        &self.speaker
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn session(&self) -> Option<&PracticeSession> {
        self.session.as_ref()
    }

    pub fn screen(&self) -> Screen {
        self.navigator.current()
    }

    pub fn previous_screen(&self) -> Screen {
        self.navigator.previous()
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        self.progress
            .save(&mut self.store, &self.config.storage_key)
            .inspect_err(|e| log::error!("Failed to save progress: {e}"))
    }

    /// Switch screens. Any running countdown stops; entering the review center starts
    /// it again if some lesson there is still locked.
    pub fn show(&mut self, screen: Screen, from: Option<Screen>, now: DateTime<Utc>) {
        self.timer.cancel();
        self.navigator.show(screen, from);
        self.entered(screen, now);
    }

    /// Return to the recorded back target, with the same timer handling as [`Self::show`].
    pub fn back(&mut self, now: DateTime<Utc>) -> Screen {
        self.timer.cancel();
        let screen = self.navigator.back();
        self.entered(screen, now);
        screen
    }

    fn entered(&mut self, screen: Screen, now: DateTime<Utc>) {
        if screen == Screen::ReviewCenter {
            self.poller.reset();
            self.poller
                .poll(&self.progress, &self.catalog, &self.stages, now);
            if self.review_center(now).has_locked() {
                self.timer.arm(self.config.countdown_tick_ms);
            }
        }
    }

    pub fn levels(&self) -> Vec<String> {
        self.catalog.level_keys().map(str::to_string).collect()
    }

    pub fn level(&self, level_key: &str, now: DateTime<Utc>) -> Result<LevelView, TrainerError> {
        LevelView::build(level_key, &self.progress, &self.catalog, &self.stages, now)
            .ok_or_else(|| TrainerError::UnknownLevel(level_key.to_string()))
    }

    pub fn select_level(
        &mut self,
        level_key: &str,
        now: DateTime<Utc>,
    ) -> Result<LevelView, TrainerError> {
        let view = self.level(level_key, now)?;
        self.show(Screen::LessonSelection, Some(Screen::LevelSelection), now);
        Ok(view)
    }

    pub fn lesson_status(&self, lesson_key: &str, now: DateTime<Utc>) -> LessonStatus {
        lesson_status(self.progress.get(lesson_key), &self.stages, now)
    }

    pub fn lesson_overview(&self, lesson_key: &str) -> Option<LessonOverview> {
        let progress = self.progress.get(lesson_key)?;
        LessonOverview::build(lesson_key, progress, &self.catalog, &self.stages)
    }

    /// Show a lesson, starting it if this is the first time it is opened.
    pub fn open_lesson(
        &mut self,
        lesson_key: &str,
        now: DateTime<Utc>,
    ) -> Result<LessonOverview, TrainerError> {
        let changed = self
            .progress
            .open_lesson(lesson_key, &self.catalog, &self.stages, now)
            .inspect_err(|e| log::error!("Cannot open lesson: {e}"))?;
        if changed {
            self.persist()?;
        }

        let overview = self
            .lesson_overview(lesson_key)
            .ok_or_else(|| ProgressError::UnknownLesson(lesson_key.to_string()))?;
        self.show(Screen::Lesson, Some(Screen::LessonSelection), now);
        Ok(overview)
    }

    pub fn review_center(&self, now: DateTime<Utc>) -> ReviewCenter {
        ReviewCenter::build(&self.progress, &self.catalog, &self.stages, now)
    }

    pub fn open_review_center(&mut self, now: DateTime<Utc>) -> ReviewCenter {
        self.show(Screen::ReviewCenter, Some(Screen::Start), now);
        self.review_center(now)
    }

    /// Review every due lesson at once. `None` if nothing is due.
    pub fn start_global_session(&mut self, now: DateTime<Utc>) -> Option<PracticeCard> {
        let session = PracticeSession::global(
            &self.progress,
            &self.catalog,
            &self.stages,
            now,
            &mut self.rng,
        )?;
        self.begin(session, Screen::ReviewCenter, now)
    }

    /// Practice one started lesson whatever its status. `None` if it owes nothing.
    pub fn start_lesson_session(
        &mut self,
        lesson_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PracticeCard>, TrainerError> {
        if !self.catalog.contains_lesson(lesson_key) {
            return Err(ProgressError::UnknownLesson(lesson_key.to_string()).into());
        }
        if self.progress.get(lesson_key).is_none() {
            return Err(ProgressError::LessonNotStarted(lesson_key.to_string()).into());
        }

        let Some(session) = PracticeSession::single_lesson(
            lesson_key,
            &self.progress,
            &self.catalog,
            &self.stages,
            &mut self.rng,
        ) else {
            return Ok(None);
        };
        Ok(self.begin(session, Screen::Lesson, now))
    }

    fn begin(
        &mut self,
        session: PracticeSession,
        from: Screen,
        now: DateTime<Utc>,
    ) -> Option<PracticeCard> {
        self.session = Some(session);
        self.writing = None;
        self.show(Screen::Practice, Some(from), now);

        match self.advance(now)? {
            PracticeStep::Card(card) => Some(card),
            PracticeStep::WritingExercise { .. } => None,
        }
    }

    /// Move the cursor on and present whatever comes next.
    fn advance(&mut self, now: DateTime<Utc>) -> Option<PracticeStep> {
        let session = self.session.as_mut()?;
        if matches!(session.queue_mut().advance(), QueueStep::Item(_)) {
            let step = self.current_step();
            self.speak_current();
            return step;
        }

        let lesson_key = session.recall_lesson()?.to_string();
        log::info!("Practice queue done, asking for `{lesson_key}`");
        self.writing = Some(WritingExercise::new(lesson_key.clone()));
        self.show(Screen::WritingExercise, Some(Screen::Practice), now);
        Some(PracticeStep::WritingExercise { lesson_key })
    }

    fn current_item(&self) -> Option<&PracticeItem> {
        self.session.as_ref()?.queue().current()
    }

    /// What the practice flow is showing right now.
    pub fn current_step(&self) -> Option<PracticeStep> {
        if let Some(writing) = &self.writing {
            return Some(PracticeStep::WritingExercise {
                lesson_key: writing.expected().to_string(),
            });
        }

        let session = self.session.as_ref()?;
        let item = session.queue().current()?;
        let sentence = self.catalog.sentence(&item.lesson_key, &item.sentence_id)?;
        let progress = self.progress.get(&item.lesson_key)?;

        Some(PracticeStep::Card(PracticeCard {
            lesson_key: item.lesson_key.clone(),
            sentence: sentence.clone(),
            reps_done: progress.reps_done(&item.sentence_id).unwrap_or(0),
            reps_needed: self.stages.required_reps(progress.stage()),
            index: session.queue().position().unwrap_or(0),
            total: session.queue().len(),
        }))
    }

    fn speak_current(&mut self) {
        let Some(item) = self.current_item() else {
            return;
        };
        let Some(sentence) = self.catalog.sentence(&item.lesson_key, &item.sentence_id) else {
            return;
        };
        let request = SpeechRequest {
            text: sentence.en.clone(),
            locale: self.config.speech_locale.clone(),
            rate: self.config.speech_rate,
        };
        self.speaker.speak(&request);
    }

    /// Say the current sentence again without moving on.
    pub fn replay(&mut self) -> bool {
        if self.current_item().is_none() {
            return false;
        }
        self.speak_current();
        true
    }

    /// Count the current item and move to the next one. `Ok(None)` if nothing is
    /// being practiced.
    ///
    /// If saving fails the repetition still counts and the cursor still moves; the
    /// error is returned and [`Self::current_step`] shows where things stand.
    pub fn record_repetition(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<PracticeStep>, TrainerError> {
        let Some(PracticeItem {
            lesson_key,
            sentence_id,
        }) = self.current_item().cloned()
        else {
            return Ok(None);
        };

        let outcome = self
            .progress
            .record_repetition(&lesson_key, &sentence_id, &self.stages, now)
            .inspect_err(|e| log::error!("Repetition not recorded: {e}"))?;
        if let RepetitionOutcome::Counted { reps_done } = outcome {
            log::debug!("`{sentence_id}` of `{lesson_key}` now at {reps_done} repetition(s)");
        }
        let step = self.advance(now);
        self.persist()?;
        Ok(step)
    }

    pub fn check_writing_answer(
        &mut self,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<WritingFeedback, TrainerError> {
        let writing = self
            .writing
            .as_mut()
            .ok_or(TrainerError::NoWritingExercise)?;
        let feedback = writing.check(answer);
        if feedback.is_correct() {
            self.finish_session(now);
        }
        Ok(feedback)
    }

    pub fn skip_writing_exercise(&mut self, now: DateTime<Utc>) {
        self.finish_session(now);
    }

    fn finish_session(&mut self, now: DateTime<Utc>) {
        self.session = None;
        self.writing = None;
        self.show(Screen::SessionComplete, Some(Screen::WritingExercise), now);
    }

    /// Called on every countdown tick. Returns the lessons whose status changed since
    /// the previous tick; an empty result means nothing needs redrawing.
    pub fn poll_statuses(&mut self, now: DateTime<Utc>) -> Vec<StatusChange> {
        let changes = self
            .poller
            .poll(&self.progress, &self.catalog, &self.stages, now);

        if !changes.is_empty()
            && self.navigator.current() == Screen::ReviewCenter
            && !self.review_center(now).has_locked()
        {
            log::debug!("Nothing left counting down, stopping the timer");
            self.timer.cancel();
        }
        changes
    }
}
