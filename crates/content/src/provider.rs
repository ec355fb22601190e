use async_trait::async_trait;
use reading_core::model::{Passage, PassageError, Question, QuestionBank, QuestionBankError};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by content providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Passage(#[from] PassageError),

    #[error(transparent)]
    QuestionBank(#[from] QuestionBankError),
}

/// Source of the passage and its pre-built questions.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch the passage, sections in reading order.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the passage cannot be loaded or is invalid.
    async fn passage(&self) -> Result<Arc<Passage>, ContentError>;

    /// Fetch the questions for the passage.
    ///
    /// Every returned question references a section of [`ContentProvider::passage`].
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the questions cannot be loaded.
    async fn questions(&self) -> Result<Vec<Question>, ContentError>;
}

/// Caller-supplied passage and questions, for tests and prototyping.
#[derive(Debug, Clone)]
pub struct InMemoryContent {
    passage: Arc<Passage>,
    questions: Vec<Question>,
}

impl InMemoryContent {
    /// # Errors
    ///
    /// Returns `ContentError::QuestionBank` if a question does not fit the passage.
    pub fn new(passage: Passage, questions: Vec<Question>) -> Result<Self, ContentError> {
        QuestionBank::new(questions.clone(), &passage)?;
        Ok(Self {
            passage: Arc::new(passage),
            questions,
        })
    }
}

#[async_trait]
impl ContentProvider for InMemoryContent {
    async fn passage(&self) -> Result<Arc<Passage>, ContentError> {
        Ok(Arc::clone(&self.passage))
    }

    async fn questions(&self) -> Result<Vec<Question>, ContentError> {
        Ok(self.questions.clone())
    }
}
