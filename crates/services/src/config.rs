use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "READING_AI_API_KEY";
pub const BASE_URL_VAR: &str = "READING_AI_BASE_URL";
pub const EVAL_MODEL_VAR: &str = "READING_AI_EVAL_MODEL";
pub const QUESTION_MODEL_VAR: &str = "READING_AI_QUESTION_MODEL";
pub const AI_TIMEOUT_VAR: &str = "READING_AI_TIMEOUT_SECS";
pub const GENERATE_QUESTIONS_VAR: &str = "READING_GENERATE_QUESTIONS";
pub const EVAL_TIMEOUT_VAR: &str = "READING_EVAL_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EVAL_MODEL: &str = "gpt-4o-mini";
const DEFAULT_QUESTION_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

//
// ─── AI CONFIG ─────────────────────────────────────────────────────────────────
//

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub eval_model: String,
    pub question_model: String,
    pub timeout: Duration,
}

impl AiConfig {
    /// Read settings from the process environment.
    ///
    /// Returns `Ok(None)` when no API key is set; AI features are then disabled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL or timeout is invalid.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`AiConfig::from_env`] with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL or timeout is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = non_blank(lookup(API_KEY_VAR)) else {
            return Ok(None);
        };

        let base_url = non_blank(lookup(BASE_URL_VAR)).unwrap_or_else(|| DEFAULT_BASE_URL.into());
        if Url::parse(&base_url).is_err() {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let eval_model =
            non_blank(lookup(EVAL_MODEL_VAR)).unwrap_or_else(|| DEFAULT_EVAL_MODEL.into());
        let question_model =
            non_blank(lookup(QUESTION_MODEL_VAR)).unwrap_or_else(|| DEFAULT_QUESTION_MODEL.into());
        let timeout = seconds(AI_TIMEOUT_VAR, lookup(AI_TIMEOUT_VAR))?.unwrap_or(DEFAULT_TIMEOUT);

        Ok(Some(Self {
            base_url,
            api_key,
            eval_model,
            question_model,
            timeout,
        }))
    }

    /// `/chat/completions` URL under the configured base.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("base_url", &self.base_url)
            .field("eval_model", &self.eval_model)
            .field("question_model", &self.question_model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

//
// ─── SESSION CONFIG ────────────────────────────────────────────────────────────
//

/// Knobs for `SessionLoopService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Ask the question generator for a fresh set on start.
    pub generate_questions: bool,
    /// Upper bound on a single evaluation or generation call.
    pub evaluation_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            generate_questions: true,
            evaluation_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let generate_questions = match non_blank(lookup(GENERATE_QUESTIONS_VAR)) {
            Some(value) => parse_bool(GENERATE_QUESTIONS_VAR, value)?,
            None => defaults.generate_questions,
        };
        let evaluation_timeout =
            seconds(EVAL_TIMEOUT_VAR, lookup(EVAL_TIMEOUT_VAR))?.unwrap_or(defaults.evaluation_timeout);
        Ok(Self {
            generate_questions,
            evaluation_timeout,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn seconds(var: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = non_blank(value) else {
        return Ok(None);
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(ConfigError::InvalidSeconds { var, value }),
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var, value }),
    }
}
