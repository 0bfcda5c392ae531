//! Per-lesson progress records and the mutations applied to them.
//!
//! The whole map is serialized under a single storage key after every mutation. The
//! JSON shape is `{ lessonKey: { stage, lastCompletion, sentenceProgress } }` with
//! `lastCompletion` as an RFC 3339 string or `null`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lesson_utils::{Catalog, StageTable};

use crate::storage::{KeyValueStore, StorageError};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("lesson `{0}` is not in the catalog")]
    UnknownLesson(String),
    #[error("lesson `{0}` has not been started")]
    LessonNotStarted(String),
    /// The catalog and the stored progress disagree about which sentences a lesson has.
    #[error("sentence `{sentence}` is not tracked for lesson `{lesson}`")]
    UnknownSentence { lesson: String, sentence: String },
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    stage: usize,
    last_completion: Option<DateTime<Utc>>,
    sentence_progress: IndexMap<String, u32>,
}

impl LessonProgress {
    pub fn new<'a>(sentence_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            stage: 0,
            last_completion: None,
            sentence_progress: sentence_ids
                .into_iter()
                .map(|id| (id.to_string(), 0))
                .collect(),
        }
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn last_completion(&self) -> Option<DateTime<Utc>> {
        self.last_completion
    }

    pub fn reps_done(&self, sentence_id: &str) -> Option<u32> {
        self.sentence_progress.get(sentence_id).copied()
    }

    pub fn sentence_progress(&self) -> &IndexMap<String, u32> {
        &self.sentence_progress
    }

    pub fn is_complete_for_stage(&self, stages: &StageTable) -> bool {
        let required = stages.required_reps(self.stage);
        self.sentence_progress.values().all(|&done| done >= required)
    }

    /// Advance one stage, zero every counter and stamp the completion time.
    /// These three changes only ever happen together.
    fn complete_stage(&mut self, stages: &StageTable, now: DateTime<Utc>) {
        self.stage = stages.clamp(self.stage + 1);
        self.sentence_progress.values_mut().for_each(|done| *done = 0);
        self.last_completion = Some(now);
    }

    /// Make the tracked sentences match the lesson's current sentences.
    /// Returns true if anything changed.
    fn reconcile<'a>(
        &mut self,
        sentence_ids: impl IntoIterator<Item = &'a str>,
        stages: &StageTable,
    ) -> bool {
        let mut reconciled: IndexMap<String, u32> = IndexMap::new();
        for id in sentence_ids {
            let done = self.sentence_progress.get(id).copied().unwrap_or(0);
            reconciled.insert(id.to_string(), done);
        }
        let clamped = stages.clamp(self.stage);

        let changed = reconciled != self.sentence_progress || clamped != self.stage;
        self.sentence_progress = reconciled;
        self.stage = clamped;
        changed
    }
}

/// What a single recorded repetition did to its lesson.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepetitionOutcome {
    Counted { reps_done: u32 },
    StageCompleted { from: usize, to: usize },
}

/// Progress for every started lesson, keyed by lesson key in the order lessons were started.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProgressStore {
    lessons: IndexMap<String, LessonProgress>,
}

impl ProgressStore {
    pub fn get(&self, lesson_key: &str) -> Option<&LessonProgress> {
        self.lessons.get(lesson_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LessonProgress)> {
        self.lessons.iter().map(|(key, progress)| (key.as_str(), progress))
    }

    pub fn lesson_keys(&self) -> impl Iterator<Item = &str> {
        self.lessons.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read the stored map. Missing or unreadable data means no progress yet.
    pub fn load(store: &impl KeyValueStore, key: &str) -> Self {
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                log::warn!("Could not read saved progress, starting fresh: {e}");
                return Self::default();
            }
        };

        Self::from_json(&raw).unwrap_or_else(|e| {
            log::warn!("Saved progress is corrupt, starting fresh: {e}");
            Self::default()
        })
    }

    pub fn save(&self, store: &mut impl KeyValueStore, key: &str) -> Result<(), StorageError> {
        let json = self.to_json()?;
        store.set(key, &json)
    }

    /// Bring every record in line with the catalog: counters for removed sentences are
    /// dropped, new sentences start at zero and out-of-range stages are clamped.
    /// Records for lessons the catalog no longer has are kept untouched.
    pub fn reconcile(&mut self, catalog: &Catalog, stages: &StageTable) -> usize {
        let mut changed = 0;
        for (lesson_key, progress) in self.lessons.iter_mut() {
            let Some(lesson) = catalog.lesson(lesson_key) else {
                log::warn!("Progress found for lesson `{lesson_key}` which is not in the catalog");
                continue;
            };
            if progress.reconcile(lesson.lesson.sentence_ids(), stages) {
                changed += 1;
            }
        }
        if changed > 0 {
            log::info!("Reconciled progress for {changed} lesson(s) with the catalog");
        }
        changed
    }

    /// Create the lesson's record the first time it is opened. Returns true if the
    /// store changed and needs to be persisted.
    ///
    /// A lesson that is already complete at stage 0 without ever having been completed
    /// (only possible when it has no sentences) is moved straight to stage 1.
    pub fn open_lesson(
        &mut self,
        lesson_key: &str,
        catalog: &Catalog,
        stages: &StageTable,
        now: DateTime<Utc>,
    ) -> Result<bool, ProgressError> {
        let lesson = catalog
            .lesson(lesson_key)
            .ok_or_else(|| ProgressError::UnknownLesson(lesson_key.to_string()))?;

        let mut changed = false;
        let progress = self
            .lessons
            .entry(lesson_key.to_string())
            .or_insert_with(|| {
                changed = true;
                LessonProgress::new(lesson.lesson.sentence_ids())
            });

        if progress.stage == 0
            && progress.last_completion.is_none()
            && !stages.is_terminal(0)
            && progress.is_complete_for_stage(stages)
        {
            progress.complete_stage(stages, now);
            changed = true;
        }

        Ok(changed)
    }

    /// Count one repetition of a sentence. When every sentence of the lesson has met the
    /// current stage's quota the lesson moves up a stage.
    ///
    /// On error nothing is modified.
    pub fn record_repetition(
        &mut self,
        lesson_key: &str,
        sentence_id: &str,
        stages: &StageTable,
        now: DateTime<Utc>,
    ) -> Result<RepetitionOutcome, ProgressError> {
        let progress = self
            .lessons
            .get_mut(lesson_key)
            .ok_or_else(|| ProgressError::LessonNotStarted(lesson_key.to_string()))?;

        let Some(done) = progress.sentence_progress.get_mut(sentence_id) else {
            return Err(ProgressError::UnknownSentence {
                lesson: lesson_key.to_string(),
                sentence: sentence_id.to_string(),
            });
        };
        *done = done.saturating_add(1);
        let reps_done = *done;

        // the terminal stage has a quota of zero, so it would otherwise "complete" forever
        if stages.is_terminal(progress.stage) || !progress.is_complete_for_stage(stages) {
            return Ok(RepetitionOutcome::Counted { reps_done });
        }

        let from = progress.stage;
        progress.complete_stage(stages, now);
        log::info!(
            "Lesson `{lesson_key}` cleared stage {from}, now at stage {}",
            progress.stage
        );
        Ok(RepetitionOutcome::StageCompleted {
            from,
            to: progress.stage,
        })
    }
}
