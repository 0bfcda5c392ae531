use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lesson_utils::{Catalog, StageTable};

use crate::progress::{LessonProgress, ProgressStore};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum StatusKind {
    /// Not yet through the first stage.
    Learning,
    /// Due for review now.
    Active,
    /// Waiting for its interval to elapse.
    Locked,
    Mastered,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct LessonStatus {
    pub status: StatusKind,
    pub stage: usize,
    /// Only reported while locked.
    #[tsify(optional, type = "string")]
    pub due_at: Option<DateTime<Utc>>,
}

/// Where a lesson stands at `now`. Pure: calling it again with the same inputs gives
/// the same answer.
pub fn lesson_status(
    progress: Option<&LessonProgress>,
    stages: &StageTable,
    now: DateTime<Utc>,
) -> LessonStatus {
    let Some(progress) = progress.filter(|p| p.stage() > 0) else {
        return LessonStatus {
            status: StatusKind::Learning,
            stage: 0,
            due_at: None,
        };
    };
    let stage = progress.stage();

    if stages.is_terminal(stage) {
        return LessonStatus {
            status: StatusKind::Mastered,
            stage,
            due_at: None,
        };
    }

    // a record past stage 0 without a completion time is treated as overdue
    let due_at = progress
        .last_completion()
        .zip(stages.interval(stage).duration())
        .map(|(completed, interval)| completed + interval);

    match due_at {
        Some(due_at) if now < due_at => LessonStatus {
            status: StatusKind::Locked,
            stage,
            due_at: Some(due_at),
        },
        _ => LessonStatus {
            status: StatusKind::Active,
            stage,
            due_at: None,
        },
    }
}

/// Started lessons that are still in the catalog, with their status, in the order
/// they were started.
pub fn started_lesson_statuses<'a>(
    progress: &'a ProgressStore,
    catalog: &'a Catalog,
    stages: &'a StageTable,
    now: DateTime<Utc>,
) -> impl Iterator<Item = (&'a str, LessonStatus)> + 'a {
    progress
        .iter()
        .filter(move |(lesson_key, _)| catalog.contains_lesson(lesson_key))
        .map(move |(lesson_key, p)| (lesson_key, lesson_status(Some(p), stages, now)))
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub lesson_key: String,
    #[tsify(optional)]
    pub previous: Option<StatusKind>,
    pub current: StatusKind,
}

/// Remembers the status of every started lesson between timer ticks so the
/// presentation only re-renders when something actually changed (typically a
/// locked lesson coming due).
#[derive(Clone, Debug, Default)]
pub struct StatusPoller {
    last: IndexMap<String, StatusKind>,
    primed: bool,
}

impl StatusPoller {
    /// Forget the last snapshot. The next poll records a fresh baseline and reports nothing.
    pub fn reset(&mut self) {
        self.last.clear();
        self.primed = false;
    }

    pub fn poll(
        &mut self,
        progress: &ProgressStore,
        catalog: &Catalog,
        stages: &StageTable,
        now: DateTime<Utc>,
    ) -> Vec<StatusChange> {
        let current: IndexMap<String, StatusKind> =
            started_lesson_statuses(progress, catalog, stages, now)
                .map(|(lesson_key, status)| (lesson_key.to_string(), status.status))
                .collect();

        let changes = if self.primed {
            current
                .iter()
                .filter_map(|(lesson_key, &status)| {
                    let previous = self.last.get(lesson_key).copied();
                    (previous != Some(status)).then(|| StatusChange {
                        lesson_key: lesson_key.clone(),
                        previous,
                        current: status,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        self.last = current;
        self.primed = true;
        changes
    }
}
