//! Plain data handed to the presentation layer. Nothing here renders anything.

use chrono::{DateTime, TimeDelta, Utc};
use lesson_utils::{Catalog, Sentence, StageTable};

use crate::progress::{LessonProgress, ProgressStore};
use crate::schedule::{LessonStatus, StatusKind, lesson_status, started_lesson_statuses};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SentenceProgressView {
    pub sentence: Sentence,
    pub reps_done: u32,
    pub reps_needed: u32,
}

impl SentenceProgressView {
    pub fn is_complete(&self) -> bool {
        self.reps_done >= self.reps_needed
    }
}

/// The lesson screen: every sentence with its counter for the current stage.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct LessonOverview {
    pub lesson_key: String,
    pub level_key: String,
    pub title: String,
    pub stage: usize,
    pub stage_name: String,
    pub sentences: Vec<SentenceProgressView>,
    /// Sentences still short of the quota; the start button shows this.
    pub incomplete: usize,
    pub complete: bool,
}

impl LessonOverview {
    pub fn build(
        lesson_key: &str,
        progress: &LessonProgress,
        catalog: &Catalog,
        stages: &StageTable,
    ) -> Option<Self> {
        let lesson = catalog.lesson(lesson_key)?;
        let reps_needed = stages.required_reps(progress.stage());

        let sentences: Vec<SentenceProgressView> = lesson
            .lesson
            .sentences
            .iter()
            .map(|sentence| SentenceProgressView {
                reps_done: progress.reps_done(&sentence.id).unwrap_or(0),
                reps_needed,
                sentence: sentence.clone(),
            })
            .collect();
        let incomplete = sentences.iter().filter(|s| !s.is_complete()).count();

        Some(Self {
            lesson_key: lesson_key.to_string(),
            level_key: lesson.level_key.to_string(),
            title: lesson.lesson.title.clone(),
            stage: progress.stage(),
            stage_name: stages.name(progress.stage()).to_string(),
            sentences,
            incomplete,
            complete: incomplete == 0,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub lesson_key: String,
    pub title: String,
    pub status: LessonStatus,
}

/// One level's lessons in display order, for the lesson-selection screen.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct LevelView {
    pub level_key: String,
    pub lessons: Vec<LessonSummary>,
}

impl LevelView {
    pub fn build(
        level_key: &str,
        progress: &ProgressStore,
        catalog: &Catalog,
        stages: &StageTable,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let level = catalog.level(level_key)?;
        let lessons = level
            .lessons
            .iter()
            .map(|(lesson_key, lesson)| LessonSummary {
                lesson_key: lesson_key.clone(),
                title: lesson.title.clone(),
                status: lesson_status(progress.get(lesson_key), stages, now),
            })
            .collect();

        Some(Self {
            level_key: level_key.to_string(),
            lessons,
        })
    }
}

/// Time left until a locked lesson comes due, broken down for display.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub ready: bool,
}

impl Countdown {
    pub fn until(due_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = due_at - now;
        if remaining <= TimeDelta::zero() {
            return Self {
                ready: true,
                ..Self::default()
            };
        }

        let total_seconds = remaining.num_seconds();
        Self {
            days: total_seconds / 86_400,
            hours: total_seconds % 86_400 / 3_600,
            minutes: total_seconds % 3_600 / 60,
            seconds: total_seconds % 60,
            ready: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLesson {
    pub lesson_key: String,
    pub title: String,
    pub sentence_count: usize,
    pub status: LessonStatus,
    #[tsify(optional)]
    pub countdown: Option<Countdown>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSection {
    pub stage: usize,
    pub stage_name: String,
    pub lessons: Vec<ReviewLesson>,
}

/// Every lesson past its first stage, grouped by stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCenter {
    pub sections: Vec<ReviewSection>,
    /// How many lessons a global review would include.
    pub active_count: usize,
}

impl ReviewCenter {
    pub fn build(
        progress: &ProgressStore,
        catalog: &Catalog,
        stages: &StageTable,
        now: DateTime<Utc>,
    ) -> Self {
        let mut sections: Vec<ReviewSection> = Vec::new();
        let mut active_count = 0;

        for (lesson_key, status) in started_lesson_statuses(progress, catalog, stages, now) {
            if status.status == StatusKind::Learning {
                continue;
            }
            let Some(lesson) = catalog.lesson(lesson_key) else {
                continue;
            };
            if status.status == StatusKind::Active {
                active_count += 1;
            }

            let entry = ReviewLesson {
                lesson_key: lesson_key.to_string(),
                title: lesson.lesson.title.clone(),
                sentence_count: lesson.lesson.sentences.len(),
                countdown: status.due_at.map(|due_at| Countdown::until(due_at, now)),
                status,
            };

            let stage = entry.status.stage;
            match sections.iter_mut().find(|section| section.stage == stage) {
                Some(section) => section.lessons.push(entry),
                None => sections.push(ReviewSection {
                    stage,
                    stage_name: stages.name(stage).to_string(),
                    lessons: vec![entry],
                }),
            }
        }
        // stable, so lessons keep their start order within a section
        sections.sort_by_key(|section| section.stage);

        Self {
            sections,
            active_count,
        }
    }

    /// Whether anything on screen is counting down.
    pub fn has_locked(&self) -> bool {
        self.lessons()
            .any(|lesson| lesson.status.status == StatusKind::Locked)
    }

    pub fn lessons(&self) -> impl Iterator<Item = &ReviewLesson> {
        self.sections.iter().flat_map(|section| section.lessons.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PracticeCard {
    pub lesson_key: String,
    pub sentence: Sentence,
    pub reps_done: u32,
    pub reps_needed: u32,
    /// Zero-based position in the queue.
    pub index: usize,
    pub total: usize,
}

/// What the practice flow shows next.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PracticeStep {
    Card(PracticeCard),
    #[serde(rename_all = "camelCase")]
    WritingExercise { lesson_key: String },
}
