use std::fmt;

use thiserror::Error;

use crate::model::{Attempt, EvaluationResult, QuestionBank, QuestionId};

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Current node of the reading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Welcome,
    Reading,
    Questions,
    Feedback,
    Retry,
    Complete,
}

impl Phase {
    /// Phases from which the user may jump to another section.
    #[must_use]
    pub fn allows_navigation(self) -> bool {
        matches!(
            self,
            Phase::Reading | Phase::Questions | Phase::Feedback | Phase::Retry
        )
    }

    /// Phases that accept typed answers.
    #[must_use]
    pub fn accepts_answers(self) -> bool {
        matches!(self, Phase::Questions | Phase::Retry)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Welcome => "welcome",
            Phase::Reading => "reading",
            Phase::Questions => "questions",
            Phase::Feedback => "feedback",
            Phase::Retry => "retry",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

//
// ─── INTENTS ───────────────────────────────────────────────────────────────────
//

/// Everything the presentation layer (or an evaluation callback) can ask of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Begin reading with the resolved question set.
    Start(QuestionBank),
    FinishedReading,
    /// Replace the draft answer text.
    UpdateInput(String),
    SubmitAnswer(String),
    /// Result of an evaluation started by `SubmitAnswer`, keyed by question.
    EvaluationCompleted {
        question_id: QuestionId,
        result: EvaluationResult,
    },
    TryAgain,
    Next,
    JumpToSection(usize),
    Restart,
}

impl Intent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Start(_) => "start",
            Intent::FinishedReading => "finished_reading",
            Intent::UpdateInput(_) => "update_input",
            Intent::SubmitAnswer(_) => "submit_answer",
            Intent::EvaluationCompleted { .. } => "evaluation_completed",
            Intent::TryAgain => "try_again",
            Intent::Next => "next",
            Intent::JumpToSection(_) => "jump_to_section",
            Intent::Restart => "restart",
        }
    }
}

//
// ─── EFFECTS ───────────────────────────────────────────────────────────────────
//

/// An answer that has been accepted and is waiting on the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvaluation {
    pub question_id: QuestionId,
    pub section_index: usize,
    pub attempt: Attempt,
    pub answer: String,
    /// First-attempt text, present only for a second attempt.
    pub previous_answer: Option<String>,
}

/// Side effect the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Evaluate(PendingEvaluation),
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons an intent is rejected. A rejected intent leaves the state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("{intent} is not allowed during {phase}")]
    InvalidPhase { intent: &'static str, phase: Phase },

    #[error("answer cannot be empty")]
    EmptyAnswer,

    #[error("an evaluation is already pending for this session")]
    EvaluationPending,

    #[error("section index {index} out of range (0..{count})")]
    SectionOutOfRange { index: usize, count: usize },

    #[error("no current question")]
    NoCurrentQuestion,

    #[error("question {0} has already been answered")]
    AlreadyAnswered(QuestionId),

    #[error("question {0} has not been answered yet")]
    NotAnswered(QuestionId),

    #[error("retry is not available for this question")]
    RetryNotAllowed,

    #[error("no evaluation is pending for question {0}")]
    NoPendingEvaluation(QuestionId),
}
