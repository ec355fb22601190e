use crate::model::{AnswerReview, ScoreTally, SessionSummary, SessionSummaryError};

use super::intent::Phase;
use super::state::SessionState;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub percent: f64,
    pub is_complete: bool,
}

/// How a section tab should be presented in the section navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    Current,
    Answered,
    Visited,
    Unvisited,
}

/// Where `Next` leads from the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    NextQuestion,
    NextSection,
    Results,
}

impl SessionState {
    /// Number of questions with an evaluated answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers().len()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.question_bank().total()
    }

    /// Share of answered questions, 0.0..=100.0.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let total = self.total_questions();
        if total == 0 {
            return 0.0;
        }
        self.answered_count() as f64 / total as f64 * 100.0
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total_questions();
        let answered = self.answered_count();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            percent: self.progress_percent(),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn score_tally(&self) -> ScoreTally {
        ScoreTally::from_records(self.answers().values())
    }

    /// Weighted score over all questions, rounded to a whole percent.
    #[must_use]
    pub fn completion_percent(&self) -> u32 {
        self.score_tally()
            .completion_percent(self.total_questions())
    }

    /// True when every question of the section has a record. Sections without
    /// questions count as answered.
    #[must_use]
    pub fn section_fully_answered(&self, section_index: usize) -> bool {
        self.question_bank()
            .section_questions(section_index)
            .all(|question| self.answers().contains_key(&question.id))
    }

    pub(crate) fn first_incomplete_section(&self) -> Option<usize> {
        (0..self.passage().section_count()).find(|&index| !self.section_fully_answered(index))
    }

    #[must_use]
    pub fn section_status(&self, section_index: usize) -> SectionStatus {
        if section_index == self.section_index() {
            SectionStatus::Current
        } else if self.section_fully_answered(section_index) {
            SectionStatus::Answered
        } else if self.visited_sections().contains(&section_index) {
            SectionStatus::Visited
        } else {
            SectionStatus::Unvisited
        }
    }

    /// Status of every section, in reading order.
    #[must_use]
    pub fn section_statuses(&self) -> Vec<SectionStatus> {
        (0..self.passage().section_count())
            .map(|index| self.section_status(index))
            .collect()
    }

    /// Whether the feedback screen should offer "try again".
    #[must_use]
    pub fn can_try_again(&self) -> bool {
        self.phase() == Phase::Feedback
            && self
                .current_answer()
                .is_some_and(crate::model::AnswerRecord::can_retry)
    }

    /// Label for the advance button; `None` outside feedback.
    #[must_use]
    pub fn next_step(&self) -> Option<NextStep> {
        if self.phase() != Phase::Feedback {
            return None;
        }
        let section_len = self.question_bank().section_len(self.section_index());
        let step = if self.question_index() + 1 < section_len {
            NextStep::NextQuestion
        } else if self.section_index() + 1 < self.passage().section_count() {
            NextStep::NextSection
        } else {
            NextStep::Results
        };
        Some(step)
    }

    /// Build the end-of-session summary with one review row per question in bank order.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::NotComplete` before the `Complete` phase and
    /// `SessionSummaryError::Unanswered` if a question lacks a record.
    pub fn summary(&self) -> Result<SessionSummary, SessionSummaryError> {
        let (Some(started_at), Some(completed_at)) = (self.started_at(), self.completed_at()) else {
            return Err(SessionSummaryError::NotComplete);
        };
        if !self.is_complete() {
            return Err(SessionSummaryError::NotComplete);
        }

        let reviews = self
            .question_bank()
            .questions()
            .iter()
            .map(|question| {
                let record = self
                    .answer(&question.id)
                    .ok_or_else(|| SessionSummaryError::Unanswered(question.id.clone()))?;
                Ok(AnswerReview {
                    question_id: question.id.clone(),
                    prompt: question.prompt.clone(),
                    answer: record.answer.clone(),
                    attempt: record.attempt,
                    result: record.result.clone(),
                })
            })
            .collect::<Result<Vec<_>, SessionSummaryError>>()?;

        SessionSummary::from_reviews(self.id(), started_at, completed_at, reviews)
    }
}
