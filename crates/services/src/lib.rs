#![forbid(unsafe_code)]

pub mod ai;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod question_generator;
pub mod sessions;

pub use reading_core::Clock;
pub use sessions as session;

pub use config::{AiConfig, SessionConfig};
pub use error::{AiError, ConfigError, EvaluatorError, QuestionGenError, SessionError};
pub use evaluator::{EvaluationRequest, Evaluator, LlmEvaluator};
pub use question_generator::{GenerationRequest, LlmQuestionGenerator, QuestionGenerator};
pub use sessions::{SessionLoopService, SessionRegistry};
