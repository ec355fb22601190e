use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("invalid attempt number: {0}")]
    InvalidAttempt(u8),
}

//
// ─── SCORE ────────────────────────────────────────────────────────────────────
//

/// Three-level classification of a free-text answer.
///
/// - `Correct`: covers the main ideas accurately
/// - `Partial`: shows some understanding but misses key points
/// - `Incorrect`: misunderstands or does not address the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Correct,
    Partial,
    Incorrect,
}

impl Score {
    /// Credit this score earns toward the completion percentage.
    #[must_use]
    pub fn credit(self) -> f64 {
        match self {
            Score::Correct => 1.0,
            Score::Partial => 0.5,
            Score::Incorrect => 0.0,
        }
    }
}

//
// ─── EVALUATION RESULT ────────────────────────────────────────────────────────
//

/// Classification plus tutor feedback for one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: Score,
    pub assessment: String,
    pub improvement: String,
}

impl EvaluationResult {
    #[must_use]
    pub fn new(score: Score, assessment: impl Into<String>, improvement: impl Into<String>) -> Self {
        Self {
            score,
            assessment: assessment.into(),
            improvement: improvement.into(),
        }
    }

    /// Result for a blank answer; produced locally, never sent to the evaluator.
    #[must_use]
    pub fn no_answer() -> Self {
        Self::new(
            Score::Incorrect,
            "No answer was provided.",
            "Try re-reading the passage and giving it another shot!",
        )
    }

    /// Result used when the evaluator replied with something unparseable.
    #[must_use]
    pub fn malformed_response() -> Self {
        Self::new(
            Score::Partial,
            "We had trouble evaluating your answer.",
            "Keep thinking about the details in the passage and try again!",
        )
    }

    /// Result used when the evaluator could not be reached at all.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(
            Score::Partial,
            "We couldn't evaluate your answer right now.",
            "Keep going, you're doing great!",
        )
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.score == Score::Correct
    }
}

//
// ─── ATTEMPT ──────────────────────────────────────────────────────────────────
//

/// First or second try at a question. There is no third.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Attempt {
    First,
    Second,
}

impl Attempt {
    /// Converts a numeric attempt (1-2) to an `Attempt`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidAttempt` for anything other than 1 or 2.
    pub fn from_u8(value: u8) -> Result<Self, AttemptError> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            _ => Err(AttemptError::InvalidAttempt(value)),
        }
    }

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Attempt::First => 1,
            Attempt::Second => 2,
        }
    }
}

impl TryFrom<u8> for Attempt {
    type Error = AttemptError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

impl From<Attempt> for u8 {
    fn from(value: Attempt) -> Self {
        value.number()
    }
}

//
// ─── ANSWER RECORD ────────────────────────────────────────────────────────────
//

/// Latest evaluated answer for a question.
///
/// A second attempt replaces the first record; only the latest is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub answer: String,
    pub attempt: Attempt,
    pub result: EvaluationResult,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        answer: impl Into<String>,
        attempt: Attempt,
        result: EvaluationResult,
    ) -> Self {
        Self {
            question_id,
            answer: answer.into(),
            attempt,
            result,
        }
    }

    /// A retry is offered only after a first attempt that was not fully correct.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.attempt == Attempt::First && !self.result.is_correct()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_only_accepts_one_or_two() {
        assert_eq!(Attempt::from_u8(1), Ok(Attempt::First));
        assert_eq!(Attempt::from_u8(2), Ok(Attempt::Second));
        assert_eq!(Attempt::from_u8(3), Err(AttemptError::InvalidAttempt(3)));
        assert_eq!(Attempt::from_u8(0), Err(AttemptError::InvalidAttempt(0)));
    }

    #[test]
    fn retry_requires_first_attempt_and_non_correct_score() {
        let qid = QuestionId::new("q1");
        let partial = EvaluationResult::new(Score::Partial, "a", "b");
        let correct = EvaluationResult::new(Score::Correct, "a", "b");

        assert!(AnswerRecord::new(qid.clone(), "x", Attempt::First, partial.clone()).can_retry());
        assert!(!AnswerRecord::new(qid.clone(), "x", Attempt::Second, partial).can_retry());
        assert!(!AnswerRecord::new(qid, "x", Attempt::First, correct).can_retry());
    }

    #[test]
    fn score_deserializes_lowercase() {
        let result: EvaluationResult = serde_json::from_str(
            r#"{"score":"partial","assessment":"ok","improvement":"more"}"#,
        )
        .unwrap();
        assert_eq!(result.score, Score::Partial);
    }

    #[test]
    fn canned_results_have_expected_scores() {
        assert_eq!(EvaluationResult::no_answer().score, Score::Incorrect);
        assert_eq!(EvaluationResult::malformed_response().score, Score::Partial);
        assert_eq!(EvaluationResult::unavailable().score, Score::Partial);
    }
}
