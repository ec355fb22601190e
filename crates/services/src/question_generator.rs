use std::fmt::Write as _;

use async_trait::async_trait;
use tracing::debug;

use reading_core::model::{Passage, Question, SectionId};

use crate::ai::{ChatClient, ModelRole, strip_code_fences};
use crate::error::{ConfigError, QuestionGenError};

const GENERATION_TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are an expert reading comprehension question designer for students. \
Generate high-quality questions that test genuine comprehension, not surface-level recall.

For each section, generate 2 questions. Vary difficulty:
- \"foundational\": Tests understanding of explicitly stated information, but requires synthesis
- \"analytical\": Requires analyzing relationships, cause/effect, or structure
- \"inferential\": Requires reading between the lines or drawing conclusions

Each question should require a typed (free-text) answer, not multiple choice.

Respond with a JSON array:
[
  {
    \"id\": \"q1\",
    \"sectionId\": \"section-1\",
    \"question\": \"...\",
    \"keyConceptsForEvaluation\": [\"concept 1\", \"concept 2\", \"concept 3\", \"concept 4\"],
    \"difficulty\": \"foundational\" | \"analytical\" | \"inferential\"
  }
]

The keyConceptsForEvaluation should be 3-4 key ideas that a good answer would cover. \
These are used by an AI evaluator to score student responses.";

/// Id and title of one section, as listed to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOutline {
    pub id: SectionId,
    pub title: String,
}

/// Input for question generation: the whole passage plus its section outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub passage_text: String,
    pub sections: Vec<SectionOutline>,
}

impl GenerationRequest {
    #[must_use]
    pub fn from_passage(passage: &Passage) -> Self {
        Self {
            passage_text: passage.full_text(),
            sections: passage
                .sections()
                .iter()
                .map(|section| SectionOutline {
                    id: section.id.clone(),
                    title: section.title.clone(),
                })
                .collect(),
        }
    }
}

/// Produces comprehension questions for a passage.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `QuestionGenError` if no usable list of questions was produced.
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, QuestionGenError>;
}

/// Question generator backed by a chat completion model.
#[derive(Debug, Clone)]
pub struct LlmQuestionGenerator {
    chat: ChatClient,
}

impl LlmQuestionGenerator {
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
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, QuestionGenError> {
        let reply = self
            .chat
            .complete(
                ModelRole::QuestionGeneration,
                SYSTEM_PROMPT,
                &user_prompt(request),
                GENERATION_TEMPERATURE,
            )
            .await?;
        let questions = parse_questions(&reply)?;
        debug!(count = questions.len(), "generated questions");
        Ok(questions)
    }
}

/// Parse a JSON array of questions, tolerating Markdown code fences.
///
/// # Errors
///
/// Returns `QuestionGenError::Malformed` for invalid JSON and
/// `QuestionGenError::Empty` for an empty array.
pub fn parse_questions(reply: &str) -> Result<Vec<Question>, QuestionGenError> {
    let questions: Vec<Question> = serde_json::from_str(strip_code_fences(reply))?;
    if questions.is_empty() {
        return Err(QuestionGenError::Empty);
    }
    Ok(questions)
}

fn user_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::from("Passage sections:\n");
    for section in &request.sections {
        let _ = writeln!(prompt, "- {}: \"{}\"", section.id, section.title);
    }
    let _ = write!(prompt, "\nFull passage:\n{}", request.passage_text);
    prompt
}
