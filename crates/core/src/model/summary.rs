use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::evaluation::{AnswerRecord, Attempt, EvaluationResult, Score};
use crate::model::ids::{QuestionId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("session has not been completed")]
    NotComplete,

    #[error("question {0} has no evaluated answer")]
    Unanswered(QuestionId),
}

//
// ─── SCORE TALLY ───────────────────────────────────────────────────────────────
//

/// Count of evaluated answers per score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreTally {
    pub correct: usize,
    pub partial: usize,
    pub incorrect: usize,
}

impl ScoreTally {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AnswerRecord>) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.add(record.result.score);
        }
        tally
    }

    pub fn add(&mut self, score: Score) {
        match score {
            Score::Correct => self.correct += 1,
            Score::Partial => self.partial += 1,
            Score::Incorrect => self.incorrect += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.correct + self.partial + self.incorrect
    }

    /// `round((correct + partial / 2) / total_questions * 100)`; zero questions yield 0.
    #[must_use]
    pub fn completion_percent(&self, total_questions: usize) -> u32 {
        if total_questions == 0 {
            return 0;
        }
        let earned = self.correct as f64 * Score::Correct.credit()
            + self.partial as f64 * Score::Partial.credit();
        let percent = (earned / total_questions as f64 * 100.0).round();
        percent.clamp(0.0, 100.0) as u32
    }
}

//
// ─── ANSWER REVIEW ─────────────────────────────────────────────────────────────
//

/// One row of the end-of-session answer review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReview {
    pub question_id: QuestionId,
    pub prompt: String,
    pub answer: String,
    pub attempt: Attempt,
    pub result: EvaluationResult,
}

//
// ─── SESSION SUMMARY ───────────────────────────────────────────────────────────
//

/// Aggregate summary for a completed reading session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    session_id: SessionId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total_questions: usize,
    tally: ScoreTally,
    reviews: Vec<AnswerReview>,
}

impl SessionSummary {
    /// Build a summary from the review rows of every question, in bank order.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_reviews(
        session_id: SessionId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        reviews: Vec<AnswerReview>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }

        let mut tally = ScoreTally::default();
        for review in &reviews {
            tally.add(review.result.score);
        }

        Ok(Self {
            session_id,
            started_at,
            completed_at,
            total_questions: reviews.len(),
            tally,
            reviews,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    #[must_use]
    pub fn tally(&self) -> ScoreTally {
        self.tally
    }

    #[must_use]
    pub fn completion_percent(&self) -> u32 {
        self.tally.completion_percent(self.total_questions)
    }

    #[must_use]
    pub fn reviews(&self) -> &[AnswerReview] {
        &self.reviews
    }
}
