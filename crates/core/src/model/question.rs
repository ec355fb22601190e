use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, SectionId};
use crate::model::passage::Passage;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question {question} references unknown section {section}")]
    UnknownSection {
        question: QuestionId,
        section: SectionId,
    },

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    #[error("question {0} has an empty prompt")]
    EmptyPrompt(QuestionId),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// How much synthesis a question demands.
///
/// - `Foundational`: explicitly stated information, but still needs synthesis
/// - `Analytical`: relationships, cause/effect, or structure
/// - `Inferential`: reading between the lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Foundational,
    Analytical,
    Inferential,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A free-text comprehension prompt bound to a single section.
///
/// The serialized shape matches what the question generator returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub section_id: SectionId,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(rename = "keyConceptsForEvaluation", default)]
    pub grading_concepts: Vec<String>,
    pub difficulty: Difficulty,
}

impl Question {
    #[must_use]
    pub fn new(
        id: impl Into<QuestionId>,
        section_id: impl Into<SectionId>,
        prompt: impl Into<String>,
        grading_concepts: Vec<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: id.into(),
            section_id: section_id.into(),
            prompt: prompt.into(),
            grading_concepts,
            difficulty,
        }
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Questions validated against a passage and grouped by section.
///
/// Within a section, questions keep the order they were supplied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_section: Vec<Vec<usize>>,
}

impl QuestionBank {
    /// Validate questions against `passage`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` for unknown section ids, duplicate question ids,
    /// or blank prompts.
    pub fn new(questions: Vec<Question>, passage: &Passage) -> Result<Self, QuestionBankError> {
        let mut by_section = vec![Vec::new(); passage.section_count()];
        let mut seen = HashSet::with_capacity(questions.len());

        for (position, question) in questions.iter().enumerate() {
            if !seen.insert(&question.id) {
                return Err(QuestionBankError::DuplicateQuestion(question.id.clone()));
            }
            if question.prompt.trim().is_empty() {
                return Err(QuestionBankError::EmptyPrompt(question.id.clone()));
            }
            let Some(section_index) = passage.index_of(&question.section_id) else {
                return Err(QuestionBankError::UnknownSection {
                    question: question.id.clone(),
                    section: question.section_id.clone(),
                });
            };
            by_section[section_index].push(position);
        }

        Ok(Self {
            questions,
            by_section,
        })
    }

    /// All questions in the order they were supplied.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Number of questions bound to the section at `section_index`.
    #[must_use]
    pub fn section_len(&self, section_index: usize) -> usize {
        self.by_section.get(section_index).map_or(0, Vec::len)
    }

    pub fn section_questions(&self, section_index: usize) -> impl Iterator<Item = &Question> {
        self.by_section
            .get(section_index)
            .into_iter()
            .flatten()
            .map(|&position| &self.questions[position])
    }

    #[must_use]
    pub fn question_at(&self, section_index: usize, question_index: usize) -> Option<&Question> {
        let position = *self.by_section.get(section_index)?.get(question_index)?;
        self.questions.get(position)
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    /// Returns `(section_index, question_index)` for a question id.
    #[must_use]
    pub fn locate(&self, id: &QuestionId) -> Option<(usize, usize)> {
        self.by_section
            .iter()
            .enumerate()
            .find_map(|(section_index, positions)| {
                positions
                    .iter()
                    .position(|&p| &self.questions[p].id == id)
                    .map(|question_index| (section_index, question_index))
            })
    }
}
