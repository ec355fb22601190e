//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use reading_content::ContentError;
use reading_core::model::{QuestionBankError, SessionId, SessionSummaryError};
use reading_core::session::TransitionError;

/// Errors emitted by `ChatClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI service is not configured")]
    Disabled,
    #[error("AI service returned an empty response")]
    EmptyResponse,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by answer evaluators.
///
/// A reply that cannot be parsed is not an error; evaluators turn it into a
/// placeholder result themselves.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvaluatorError {
    #[error("evaluation timed out after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Errors emitted by question generators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionGenError {
    #[error("question generation timed out after {0:?}")]
    TimedOut(Duration),
    #[error("question generator returned no questions")]
    Empty,
    #[error("question generator returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] QuestionBankError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
    #[error("{var} must be a boolean, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("session store unavailable: {0}")]
    Lock(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("evaluation task failed: {0}")]
    EvaluationTask(#[from] tokio::task::JoinError),
}
