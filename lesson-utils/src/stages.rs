//! The spaced-repetition ladder every lesson climbs.
//!
//! Each rung says how many repetitions of every sentence are needed to clear it
//! and how long the learner waits after clearing it before the next review opens.

use chrono::TimeDelta;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interval {
    Days(u32),
    /// The terminal stage never comes due again.
    Never,
}

impl Interval {
    pub fn duration(&self) -> Option<TimeDelta> {
        match self {
            Interval::Days(days) => Some(TimeDelta::days(i64::from(*days))),
            Interval::Never => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub interval: Interval,
    /// Repetitions per sentence needed to clear the stage. Zero on the terminal stage.
    pub reps: u32,
}

pub const SRS_STAGES: [Stage; 6] = [
    // learning: next review one day after the lesson is first cleared
    Stage {
        name: "مرحلة التعلم",
        interval: Interval::Days(1),
        reps: 6,
    },
    Stage {
        name: "مراجعة اليوم التالي",
        interval: Interval::Days(3),
        reps: 4,
    },
    Stage {
        name: "مراجعة بعد 3 أيام",
        interval: Interval::Days(7),
        reps: 3,
    },
    Stage {
        name: "مراجعة بعد 7 أيام",
        interval: Interval::Days(19),
        reps: 2,
    },
    Stage {
        name: "مراجعة بعد 30 يومًا",
        interval: Interval::Days(30),
        reps: 2,
    },
    Stage {
        name: "مرحلة الإتقان",
        interval: Interval::Never,
        reps: 0,
    },
];

/// A non-empty, read-only view over an ordered list of stages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StageTable {
    stages: &'static [Stage],
}

impl Default for StageTable {
    fn default() -> Self {
        Self {
            stages: &SRS_STAGES,
        }
    }
}

impl StageTable {
    /// Returns `None` for an empty list, since every lesson needs a stage 0.
    pub fn new(stages: &'static [Stage]) -> Option<Self> {
        (!stages.is_empty()).then_some(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn terminal_index(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index >= self.terminal_index()
    }

    /// Clamps an index read from storage back into the table.
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.terminal_index())
    }

    pub fn required_reps(&self, index: usize) -> u32 {
        self.stages[self.clamp(index)].reps
    }

    pub fn interval(&self, index: usize) -> Interval {
        self.stages[self.clamp(index)].interval
    }

    pub fn name(&self, index: usize) -> &'static str {
        self.stages[self.clamp(index)].name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_ends_in_mastery() {
        let table = StageTable::default();
        assert_eq!(table.len(), 6);
        assert_eq!(table.terminal_index(), 5);
        assert_eq!(table.required_reps(5), 0);
        assert_eq!(table.interval(5), Interval::Never);
        assert!(table.is_terminal(5));
        assert!(!table.is_terminal(4));
    }

    #[test]
    fn quotas_shrink_as_intervals_grow() {
        let table = StageTable::default();
        let reps: Vec<u32> = table.iter().map(|s| s.reps).collect();
        assert_eq!(reps, vec![6, 4, 3, 2, 2, 0]);
        assert_eq!(table.interval(1).duration(), Some(TimeDelta::days(3)));
    }

    #[test]
    fn out_of_range_indices_clamp_to_terminal() {
        let table = StageTable::default();
        assert_eq!(table.clamp(42), 5);
        assert_eq!(table.required_reps(42), 0);
        assert_eq!(table.name(42), "مرحلة الإتقان");
    }

    #[test]
    fn empty_table_is_rejected() {
        static NONE: [Stage; 0] = [];
        assert!(StageTable::new(&NONE).is_none());
    }
}
