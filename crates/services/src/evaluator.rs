use std::fmt::Write as _;

use async_trait::async_trait;
use tracing::{debug, warn};

use reading_core::model::{Attempt, EvaluationResult, Question, Section};
use reading_core::session::PendingEvaluation;

use crate::ai::{ChatClient, ModelRole, strip_code_fences};
use crate::error::{ConfigError, EvaluatorError};

const EVALUATION_TEMPERATURE: f32 = 0.3;

/// Everything an evaluator needs to grade one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub question: String,
    pub answer: String,
    pub key_concepts: Vec<String>,
    /// Text of the question's own section; grading must not rely on anything else.
    pub section_content: String,
    pub attempt: Attempt,
    pub previous_answer: Option<String>,
}

impl EvaluationRequest {
    #[must_use]
    pub fn from_pending(pending: &PendingEvaluation, question: &Question, section: &Section) -> Self {
        Self {
            question: question.prompt.clone(),
            answer: pending.answer.clone(),
            key_concepts: question.grading_concepts.clone(),
            section_content: section.content.clone(),
            attempt: pending.attempt,
            previous_answer: pending.previous_answer.clone(),
        }
    }
}

/// Grades free-text answers.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// # Errors
    ///
    /// Returns `EvaluatorError` when no result could be obtained at all.
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError>;
}

/// Evaluator backed by a chat completion model.
#[derive(Debug, Clone)]
pub struct LlmEvaluator {
    chat: ChatClient,
}

impl LlmEvaluator {
    #[must_use]
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the environment holds invalid AI settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ChatClient::from_env()?))
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        if request.answer.trim().is_empty() {
            return Ok(EvaluationResult::no_answer());
        }

        let reply = self
            .chat
            .complete(
                ModelRole::Evaluation,
                &system_prompt(request),
                &user_prompt(request),
                EVALUATION_TEMPERATURE,
            )
            .await?;
        debug!(attempt = request.attempt.number(), "evaluation reply received");
        Ok(parse_evaluation(&reply))
    }
}

/// Parse a model reply, falling back to the malformed-response placeholder.
#[must_use]
pub fn parse_evaluation(reply: &str) -> EvaluationResult {
    match serde_json::from_str::<EvaluationResult>(strip_code_fences(reply)) {
        Ok(result) => result,
        Err(err) => {
            warn!(%err, "could not parse evaluation reply");
            EvaluationResult::malformed_response()
        }
    }
}

fn system_prompt(request: &EvaluationRequest) -> String {
    let mut prompt = String::from(
        "You are a friendly, encouraging reading comprehension tutor for students. \
Evaluate the student's answer to a reading comprehension question.\n\n\
IMPORTANT: Only evaluate the answer based on the following passage section. \
Do NOT use outside knowledge. The student has only read this section so far:\n\n\"\"\"\n",
    );
    prompt.push_str(&request.section_content);
    prompt.push_str("\n\"\"\"\n\nKey concepts from this section that the answer should cover:\n");
    for concept in &request.key_concepts {
        let _ = writeln!(prompt, "- {concept}");
    }
    prompt.push_str(
        "\nRespond with JSON only, no markdown:\n\
{\n  \"score\": \"correct\" | \"partial\" | \"incorrect\",\n  \"assessment\": \"...\",\n  \"improvement\": \"...\"\n}\n\n\
Scoring guide:\n\
- \"correct\": Covers the main ideas accurately. Doesn't need to be word-perfect.\n\
- \"partial\": Shows some understanding but misses key points.\n\
- \"incorrect\": Misunderstands or doesn't address the question.\n\n\
\"assessment\": Acknowledge what they got right or where they went wrong. \
Be specific about which concepts they nailed. (2-3 sentences max)\n\n\
\"improvement\": Actionable guidance on how to strengthen the answer. \
For correct answers, mention a small detail that could make it even better. \
For partial/incorrect, point them to the specific part of the passage that holds the key. (2-3 sentences max)\n\n\
Tone: Warm and encouraging, never clinical. This should feel like a tutor, not a test.",
    );
    if let (Attempt::Second, Some(previous)) = (request.attempt, &request.previous_answer) {
        let _ = write!(
            prompt,
            "\n\nThis is the student's second attempt. Their first answer was: \"{previous}\". \
Evaluate whether they improved and acknowledge the effort."
        );
    }
    prompt
}

fn user_prompt(request: &EvaluationRequest) -> String {
    format!(
        "Question: {}\n\nStudent's answer: {}",
        request.question, request.answer
    )
}
