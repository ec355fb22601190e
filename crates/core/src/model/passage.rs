use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::SectionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PassageError {
    #[error("passage must contain at least one section")]
    NoSections,

    #[error("section id cannot be empty")]
    EmptySectionId,

    #[error("duplicate section id: {0}")]
    DuplicateSection(SectionId),
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// One ordered chunk of the passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub content: String,
}

impl Section {
    #[must_use]
    pub fn new(id: impl Into<SectionId>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

//
// ─── PASSAGE ───────────────────────────────────────────────────────────────────
//

/// The full reading passage: a title plus its sections in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    title: String,
    sections: Vec<Section>,
}

impl Passage {
    /// Builds a passage from ordered sections.
    ///
    /// # Errors
    ///
    /// Returns `PassageError::NoSections` for an empty list, `EmptySectionId` for a blank id,
    /// and `DuplicateSection` if two sections share an id.
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Result<Self, PassageError> {
        if sections.is_empty() {
            return Err(PassageError::NoSections);
        }

        let mut seen = HashSet::with_capacity(sections.len());
        for section in &sections {
            if section.id.as_str().trim().is_empty() {
                return Err(PassageError::EmptySectionId);
            }
            if !seen.insert(&section.id) {
                return Err(PassageError::DuplicateSection(section.id.clone()));
            }
        }

        Ok(Self {
            title: title.into(),
            sections,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Number of sections; always at least one.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn index_of(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|section| &section.id == id)
    }

    /// All section bodies joined with blank lines, as sent to question generation.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
