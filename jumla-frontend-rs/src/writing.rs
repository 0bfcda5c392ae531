use lesson_utils::text_cleanup::normalize_answer;

pub const CORRECT_FEEDBACK: &str = "صحيح! أحسنت.";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WritingFeedback {
    Correct { message: String },
    Incorrect { message: String, expected: String },
}

impl WritingFeedback {
    pub fn is_correct(&self) -> bool {
        matches!(self, WritingFeedback::Correct { .. })
    }
}

/// The free-text check shown once a session's queue runs out. The learner has to type
/// the key of the lesson they just practiced.
// TODO: ask for a sentence from the lesson instead of its key once the catalog carries
// an answer field for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WritingExercise {
    expected: String,
    solved: bool,
}

impl WritingExercise {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            solved: false,
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Once answered correctly the exercise is locked and keeps reporting success.
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn check(&mut self, answer: &str) -> WritingFeedback {
        if self.solved || normalize_answer(answer) == normalize_answer(&self.expected) {
            self.solved = true;
            return WritingFeedback::Correct {
                message: CORRECT_FEEDBACK.to_string(),
            };
        }

        WritingFeedback::Incorrect {
            message: format!("حاول مرة أخرى. الإجابة الصحيحة هي: {}", self.expected),
            expected: self.expected.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_is_trimmed_and_case_insensitive() {
        let mut exercise = WritingExercise::new("about");
        assert!(exercise.check("  About \n").is_correct());
        assert!(exercise.is_solved());
    }

    #[test]
    fn wrong_answer_reveals_the_expected_one() {
        let mut exercise = WritingExercise::new("about");
        let feedback = exercise.check("above");
        assert_eq!(
            feedback,
            WritingFeedback::Incorrect {
                message: "حاول مرة أخرى. الإجابة الصحيحة هي: about".to_string(),
                expected: "about".to_string(),
            }
        );
        assert!(!exercise.is_solved());
    }

    #[test]
    fn inner_spacing_must_match() {
        let mut exercise = WritingExercise::new("what about");
        assert!(!exercise.check("what   about").is_correct());
        assert!(exercise.check(" What About").is_correct());
    }

    #[test]
    fn solved_exercise_stays_solved() {
        let mut exercise = WritingExercise::new("about");
        exercise.check("about");
        assert!(exercise.check("something else").is_correct());
    }
}
