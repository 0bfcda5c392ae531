use chrono::{DateTime, Utc};
use lesson_utils::{Catalog, StageTable};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::progress::ProgressStore;
use crate::schedule::{StatusKind, started_lesson_statuses};

/// One repetition of one sentence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PracticeItem {
    pub lesson_key: String,
    pub sentence_id: String,
}

/// Every repetition still owed by the given lessons at their current stage, in a
/// uniformly random order.
///
/// Lessons that were never started or are not in the catalog contribute nothing.
pub fn build_queue<'a, R: Rng + ?Sized>(
    lesson_keys: impl IntoIterator<Item = &'a str>,
    progress: &ProgressStore,
    catalog: &Catalog,
    stages: &StageTable,
    rng: &mut R,
) -> Vec<PracticeItem> {
    let mut items = Vec::new();

    for lesson_key in lesson_keys {
        let (Some(lesson_progress), Some(lesson)) =
            (progress.get(lesson_key), catalog.lesson(lesson_key))
        else {
            log::warn!("Skipping lesson `{lesson_key}` with no progress or catalog entry");
            continue;
        };
        let required = stages.required_reps(lesson_progress.stage());

        for sentence in &lesson.lesson.sentences {
            let done = lesson_progress.reps_done(&sentence.id).unwrap_or(0);
            let needed = required.saturating_sub(done);
            items.extend((0..needed).map(|_| PracticeItem {
                lesson_key: lesson_key.to_string(),
                sentence_id: sentence.id.clone(),
            }));
        }
    }

    // Fisher-Yates; every permutation is equally likely
    items.shuffle(rng);
    items
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Position {
    BeforeStart,
    At(usize),
    Exhausted,
}

pub enum QueueStep<'a> {
    Item(&'a PracticeItem),
    Exhausted,
}

/// A one-way cursor over a built queue. It starts before the first item and stays
/// exhausted once it has moved past the last one.
#[derive(Clone, Debug)]
pub struct PracticeQueue {
    items: Vec<PracticeItem>,
    position: Position,
}

impl PracticeQueue {
    pub fn new(items: Vec<PracticeItem>) -> Self {
        Self {
            items,
            position: Position::BeforeStart,
        }
    }

    pub fn advance(&mut self) -> QueueStep<'_> {
        let next = match self.position {
            Position::BeforeStart => 0,
            Position::At(index) => index + 1,
            Position::Exhausted => self.items.len(),
        };

        if next < self.items.len() {
            self.position = Position::At(next);
            QueueStep::Item(&self.items[next])
        } else {
            self.position = Position::Exhausted;
            QueueStep::Exhausted
        }
    }

    pub fn current(&self) -> Option<&PracticeItem> {
        match self.position {
            Position::At(index) => self.items.get(index),
            Position::BeforeStart | Position::Exhausted => None,
        }
    }

    /// Zero-based index of the current item.
    pub fn position(&self) -> Option<usize> {
        match self.position {
            Position::At(index) => Some(index),
            Position::BeforeStart | Position::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.position == Position::Exhausted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[PracticeItem] {
        &self.items
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    /// Every lesson that is due right now.
    Global,
    /// One lesson picked by the learner, whatever its status.
    SingleLesson,
}

#[derive(Clone, Debug)]
pub struct PracticeSession {
    mode: SessionMode,
    lessons: Vec<String>,
    queue: PracticeQueue,
}

impl PracticeSession {
    /// A review of every active lesson. `None` if nothing is owed.
    pub fn global<R: Rng + ?Sized>(
        progress: &ProgressStore,
        catalog: &Catalog,
        stages: &StageTable,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<Self> {
        let lessons: Vec<String> = started_lesson_statuses(progress, catalog, stages, now)
            .filter(|(_, status)| status.status == StatusKind::Active)
            .map(|(lesson_key, _)| lesson_key.to_string())
            .collect();

        Self::build(SessionMode::Global, lessons, progress, catalog, stages, rng)
    }

    /// Practice of one lesson, used when learning it for the first time. `None` if the
    /// lesson owes nothing at its current stage.
    pub fn single_lesson<R: Rng + ?Sized>(
        lesson_key: &str,
        progress: &ProgressStore,
        catalog: &Catalog,
        stages: &StageTable,
        rng: &mut R,
    ) -> Option<Self> {
        Self::build(
            SessionMode::SingleLesson,
            vec![lesson_key.to_string()],
            progress,
            catalog,
            stages,
            rng,
        )
    }

    fn build<R: Rng + ?Sized>(
        mode: SessionMode,
        lessons: Vec<String>,
        progress: &ProgressStore,
        catalog: &Catalog,
        stages: &StageTable,
        rng: &mut R,
    ) -> Option<Self> {
        let items = build_queue(
            lessons.iter().map(String::as_str),
            progress,
            catalog,
            stages,
            rng,
        );
        if items.is_empty() {
            log::debug!("No repetitions owed for {mode:?} session, not starting it");
            return None;
        }

        log::info!(
            "Starting {mode:?} session with {} repetitions across {} lesson(s)",
            items.len(),
            lessons.len()
        );
        Some(Self {
            mode,
            lessons,
            queue: PracticeQueue::new(items),
        })
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn lessons(&self) -> &[String] {
        &self.lessons
    }

    /// The lesson the closing writing exercise asks about: the practiced lesson, or
    /// the first due lesson of a global review.
    pub fn recall_lesson(&self) -> Option<&str> {
        self.lessons.first().map(String::as_str)
    }

    pub fn queue(&self) -> &PracticeQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut PracticeQueue {
        &mut self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{"l": {
                "a": {"title": "A", "sentences": [
                    {"id": "a1", "en": "", "ar": "", "context": "", "highlight": ""},
                    {"id": "a2", "en": "", "ar": "", "context": "", "highlight": ""}
                ]},
                "b": {"title": "B", "sentences": [
                    {"id": "b1", "en": "", "ar": "", "context": "", "highlight": ""}
                ]},
                "c": {"title": "C", "sentences": [
                    {"id": "c1", "en": "", "ar": "", "context": "", "highlight": ""}
                ]}
            }}"#,
        )
        .unwrap()
    }

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn progress() -> ProgressStore {
        // a: stage 1 (4 reps), due. b: stage 2 (3 reps), locked. c: not started.
        ProgressStore::from_json(&format!(
            r#"{{
                "a": {{"stage": 1, "lastCompletion": "{due}", "sentenceProgress": {{"a1": 1, "a2": 9}}}},
                "b": {{"stage": 2, "lastCompletion": "{recent}", "sentenceProgress": {{"b1": 0}}}}
            }}"#,
            due = (t() - TimeDelta::days(10)).to_rfc3339(),
            recent = t().to_rfc3339(),
        ))
        .unwrap()
    }

    #[test]
    fn queue_holds_exactly_the_owed_repetitions() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let items = build_queue(
            ["a", "b"],
            &progress(),
            &catalog(),
            &StageTable::default(),
            &mut rng,
        );

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in &items {
            *counts.entry(item.sentence_id.as_str()).or_default() += 1;
        }
        // a1 owes 3, a2 is over quota, b1 owes 3
        assert_eq!(items.len(), 6);
        assert_eq!(counts.get("a1"), Some(&3));
        assert_eq!(counts.get("a2"), None);
        assert_eq!(counts.get("b1"), Some(&3));
    }

    #[test]
    fn unstarted_lessons_contribute_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let items = build_queue(
            ["c", "nowhere"],
            &progress(),
            &catalog(),
            &StageTable::default(),
            &mut rng,
        );
        assert!(items.is_empty());
    }

    #[test]
    fn shuffle_reaches_every_ordering() {
        // three distinct items have six orderings; a uniform shuffle hits all of them
        let json = r#"{"x": {"stage": 0, "lastCompletion": null,
            "sentenceProgress": {"x1": 5, "x2": 5, "x3": 5}}}"#;
        let progress = ProgressStore::from_json(json).unwrap();
        let catalog = Catalog::from_json(
            r#"{"l": {"x": {"title": "X", "sentences": [
                {"id": "x1", "en": "", "ar": "", "context": "", "highlight": ""},
                {"id": "x2", "en": "", "ar": "", "context": "", "highlight": ""},
                {"id": "x3", "en": "", "ar": "", "context": "", "highlight": ""}
            ]}}}"#,
        )
        .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
        for _ in 0..600 {
            let order = build_queue(["x"], &progress, &catalog, &StageTable::default(), &mut rng)
                .into_iter()
                .map(|item| item.sentence_id)
                .collect::<Vec<_>>();
            *seen.entry(order).or_default() += 1;
        }
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&n| n > 50), "skewed shuffle: {seen:?}");
    }

    #[test]
    fn cursor_walks_once_then_reports_exhausted() {
        let items: Vec<PracticeItem> = ["s1", "s2"]
            .iter()
            .map(|id| PracticeItem {
                lesson_key: "a".to_string(),
                sentence_id: id.to_string(),
            })
            .collect();
        let mut queue = PracticeQueue::new(items);

        assert_eq!(queue.current(), None);
        assert!(matches!(queue.advance(), QueueStep::Item(item) if item.sentence_id == "s1"));
        assert_eq!(queue.position(), Some(0));
        assert!(matches!(queue.advance(), QueueStep::Item(item) if item.sentence_id == "s2"));
        assert!(matches!(queue.advance(), QueueStep::Exhausted));
        assert!(queue.is_exhausted());
        assert_eq!(queue.current(), None);
        assert!(matches!(queue.advance(), QueueStep::Exhausted));
    }

    #[test]
    fn empty_queue_is_exhausted_on_first_advance() {
        let mut queue = PracticeQueue::new(Vec::new());
        assert!(matches!(queue.advance(), QueueStep::Exhausted));
    }

    #[test]
    fn global_session_only_takes_due_lessons() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let session = PracticeSession::global(
            &progress(),
            &catalog(),
            &StageTable::default(),
            t(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(session.mode(), SessionMode::Global);
        assert_eq!(session.lessons(), ["a".to_string()]);
        assert_eq!(session.recall_lesson(), Some("a"));
        assert_eq!(session.queue().len(), 3);
        assert!(session.queue().items().iter().all(|item| item.lesson_key == "a"));
    }

    #[test]
    fn global_session_skips_learning_and_mastered_lessons() {
        // c: stage 0 owes 6, b: mastered, a: due and owes 3
        let json = format!(
            r#"{{
                "c": {{"stage": 0, "lastCompletion": null, "sentenceProgress": {{"c1": 0}}}},
                "b": {{"stage": 5, "lastCompletion": "{old}", "sentenceProgress": {{"b1": 0}}}},
                "a": {{"stage": 1, "lastCompletion": "{old}", "sentenceProgress": {{"a1": 1, "a2": 4}}}}
            }}"#,
            old = (t() - TimeDelta::days(100)).to_rfc3339(),
        );
        let progress = ProgressStore::from_json(&json).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let session =
            PracticeSession::global(&progress, &catalog(), &StageTable::default(), t(), &mut rng)
                .unwrap();

        assert_eq!(session.lessons(), ["a".to_string()]);
        assert_eq!(session.recall_lesson(), Some("a"));
        assert_eq!(session.queue().len(), 3);
        assert!(session.queue().items().iter().all(|item| item.sentence_id == "a1"));
    }

    #[test]
    fn single_lesson_session_ignores_status() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let session = PracticeSession::single_lesson(
            "b",
            &progress(),
            &catalog(),
            &StageTable::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(session.mode(), SessionMode::SingleLesson);
        assert_eq!(session.recall_lesson(), Some("b"));
        assert_eq!(session.queue().len(), 3);
    }

    #[test]
    fn nothing_owed_means_no_session() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(
            PracticeSession::single_lesson(
                "c",
                &progress(),
                &catalog(),
                &StageTable::default(),
                &mut rng
            )
            .is_none()
        );
        let caught_up = t() - TimeDelta::days(20);
        assert!(
            PracticeSession::global(
                &ProgressStore::default(),
                &catalog(),
                &StageTable::default(),
                caught_up,
                &mut rng
            )
            .is_none()
        );
    }
}
