mod evaluation;
mod ids;
mod passage;
mod question;
mod summary;

pub use evaluation::{AnswerRecord, Attempt, AttemptError, EvaluationResult, Score};
pub use ids::{QuestionId, SectionId, SessionId};
pub use passage::{Passage, PassageError, Section};
pub use question::{Difficulty, Question, QuestionBank, QuestionBankError};
pub use summary::{AnswerReview, ScoreTally, SessionSummary, SessionSummaryError};
