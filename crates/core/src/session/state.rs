use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::model::{
    AnswerRecord, Attempt, Passage, Question, QuestionBank, QuestionId, Section, SessionId,
};

use super::intent::{Effect, Intent, PendingEvaluation, Phase, TransitionError};

/// New state plus the side effect (if any) the caller has to run.
#[derive(Debug, Clone)]
#[must_use]
pub struct Transition {
    pub state: SessionState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn settled(state: SessionState) -> Self {
        Self {
            state,
            effect: None,
        }
    }
}

/// All progression state of one reading session.
///
/// The value is never mutated in place by callers: [`SessionState::apply`] takes an
/// intent and returns a fresh state, leaving `self` intact when the intent is rejected.
/// Passage and question bank are shared behind `Arc`, so cloning stays cheap.
#[derive(Clone)]
pub struct SessionState {
    id: SessionId,
    passage: Arc<Passage>,
    questions: Arc<QuestionBank>,
    initial_questions: Arc<QuestionBank>,
    phase: Phase,
    section_index: usize,
    question_index: usize,
    answers: HashMap<QuestionId, AnswerRecord>,
    visited: BTreeSet<usize>,
    input: String,
    pending: Option<PendingEvaluation>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Create a session in the `Welcome` phase.
    ///
    /// `questions` must have been validated against `passage`; it is the set shown
    /// until `Start` assigns another one, and the set `Restart` returns to.
    #[must_use]
    pub fn new(id: SessionId, passage: Arc<Passage>, questions: Arc<QuestionBank>) -> Self {
        Self {
            id,
            passage,
            questions: Arc::clone(&questions),
            initial_questions: questions,
            phase: Phase::Welcome,
            section_index: 0,
            question_index: 0,
            answers: HashMap::new(),
            visited: BTreeSet::from([0]),
            input: String::new(),
            pending: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn passage(&self) -> &Passage {
        &self.passage
    }

    #[must_use]
    pub fn question_bank(&self) -> &QuestionBank {
        &self.questions
    }

    /// The set the session was created with, used when no other set is available.
    #[must_use]
    pub fn initial_questions(&self) -> &QuestionBank {
        &self.initial_questions
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn section_index(&self) -> usize {
        self.section_index
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, AnswerRecord> {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, id: &QuestionId) -> Option<&AnswerRecord> {
        self.answers.get(id)
    }

    #[must_use]
    pub fn visited_sections(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    /// Draft answer text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingEvaluation> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn is_evaluating(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn current_section(&self) -> &Section {
        // section_index is kept in range by every transition
        &self.passage.sections()[self.section_index]
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions
            .question_at(self.section_index, self.question_index)
    }

    /// Record for the current question, if it has been evaluated.
    #[must_use]
    pub fn current_answer(&self) -> Option<&AnswerRecord> {
        self.current_question()
            .and_then(|question| self.answers.get(&question.id))
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Apply `intent` and return the resulting state.
    ///
    /// `now` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` when a guard rejects the intent; `self` is unchanged.
    pub fn apply(&self, intent: Intent, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        let name = intent.name();
        let result = match intent {
            Intent::Start(bank) => self.start(bank, now),
            Intent::FinishedReading => self.finished_reading(now),
            Intent::UpdateInput(text) => self.update_input(text),
            Intent::SubmitAnswer(text) => self.submit_answer(text),
            Intent::EvaluationCompleted {
                question_id,
                result,
            } => self.evaluation_completed(question_id, result),
            Intent::TryAgain => self.try_again(),
            Intent::Next => self.next(now),
            Intent::JumpToSection(index) => self.jump_to_section(index),
            Intent::Restart => self.restart(),
        };

        match &result {
            Ok(transition) if transition.state.phase != self.phase => {
                info!(
                    session = %self.id,
                    intent = name,
                    from = %self.phase,
                    to = %transition.state.phase,
                    section = transition.state.section_index,
                    question = transition.state.question_index,
                    "phase changed"
                );
            }
            Ok(_) => {}
            Err(err) => {
                debug!(session = %self.id, intent = name, phase = %self.phase, %err, "intent rejected");
            }
        }

        result
    }

    fn start(&self, bank: QuestionBank, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        self.require_phase("start", &[Phase::Welcome])?;
        let mut next = Self::new(self.id, Arc::clone(&self.passage), Arc::new(bank));
        next.phase = Phase::Reading;
        next.started_at = Some(now);
        Ok(Transition::settled(next))
    }

    fn finished_reading(&self, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        self.require_phase("finished_reading", &[Phase::Reading])?;
        let mut next = self.clone();
        next.question_index = 0;
        if next.questions.section_len(next.section_index) == 0 {
            // nothing to ask here; move on as if the section's last question was done
            next.leave_section(now)?;
        } else {
            next.phase = Phase::Questions;
        }
        Ok(Transition::settled(next))
    }

    fn update_input(&self, text: String) -> Result<Transition, TransitionError> {
        if !self.phase.accepts_answers() {
            return Err(TransitionError::InvalidPhase {
                intent: "update_input",
                phase: self.phase,
            });
        }
        let mut next = self.clone();
        next.input = text;
        Ok(Transition::settled(next))
    }

    fn submit_answer(&self, text: String) -> Result<Transition, TransitionError> {
        self.require_phase("submit_answer", &[Phase::Questions, Phase::Retry])?;
        if self.pending.is_some() {
            return Err(TransitionError::EvaluationPending);
        }
        if text.trim().is_empty() {
            return Err(TransitionError::EmptyAnswer);
        }
        let question = self
            .current_question()
            .ok_or(TransitionError::NoCurrentQuestion)?;
        let existing = self.answers.get(&question.id);

        let (attempt, previous_answer) = match self.phase {
            Phase::Retry => {
                let record = existing
                    .filter(|record| record.can_retry())
                    .ok_or(TransitionError::RetryNotAllowed)?;
                (Attempt::Second, Some(record.answer.clone()))
            }
            _ => {
                if existing.is_some() {
                    return Err(TransitionError::AlreadyAnswered(question.id.clone()));
                }
                (Attempt::First, None)
            }
        };

        let pending = PendingEvaluation {
            question_id: question.id.clone(),
            section_index: self.section_index,
            attempt,
            answer: text,
            previous_answer,
        };

        let mut next = self.clone();
        next.pending = Some(pending.clone());
        Ok(Transition {
            state: next,
            effect: Some(Effect::Evaluate(pending)),
        })
    }

    fn evaluation_completed(
        &self,
        question_id: QuestionId,
        result: crate::model::EvaluationResult,
    ) -> Result<Transition, TransitionError> {
        let pending = self
            .pending
            .as_ref()
            .filter(|pending| pending.question_id == question_id)
            .ok_or_else(|| TransitionError::NoPendingEvaluation(question_id.clone()))?;

        let mut next = self.clone();
        next.answers.insert(
            question_id.clone(),
            AnswerRecord::new(question_id.clone(), pending.answer.clone(), pending.attempt, result),
        );
        next.pending = None;

        // Only surface feedback if the user is still looking at this question.
        let still_current = next
            .current_question()
            .is_some_and(|question| question.id == question_id);
        if next.phase.accepts_answers() && still_current {
            next.phase = Phase::Feedback;
        }
        Ok(Transition::settled(next))
    }

    fn try_again(&self) -> Result<Transition, TransitionError> {
        self.require_phase("try_again", &[Phase::Feedback])?;
        if !self.current_answer().is_some_and(AnswerRecord::can_retry) {
            return Err(TransitionError::RetryNotAllowed);
        }
        let mut next = self.clone();
        next.input.clear();
        next.phase = Phase::Retry;
        Ok(Transition::settled(next))
    }

    fn next(&self, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        self.require_phase("next", &[Phase::Feedback, Phase::Questions])?;
        if self.phase == Phase::Questions {
            // Skipping ahead from the question screen is only possible for a question
            // answered on an earlier visit.
            let question = self
                .current_question()
                .ok_or(TransitionError::NoCurrentQuestion)?;
            let in_flight = self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.question_id == question.id);
            if in_flight || !self.answers.contains_key(&question.id) {
                return Err(TransitionError::NotAnswered(question.id.clone()));
            }
        }

        let mut next = self.clone();
        next.input.clear();
        if next.question_index + 1 < next.questions.section_len(next.section_index) {
            next.question_index += 1;
            next.phase = Phase::Questions;
        } else {
            next.leave_section(now)?;
        }
        Ok(Transition::settled(next))
    }

    fn jump_to_section(&self, index: usize) -> Result<Transition, TransitionError> {
        if !self.phase.allows_navigation() {
            return Err(TransitionError::InvalidPhase {
                intent: "jump_to_section",
                phase: self.phase,
            });
        }
        let count = self.passage.section_count();
        if index >= count {
            return Err(TransitionError::SectionOutOfRange { index, count });
        }
        let mut next = self.clone();
        next.section_index = index;
        next.visited.insert(index);
        next.question_index = 0;
        next.input.clear();
        next.phase = Phase::Reading;
        Ok(Transition::settled(next))
    }

    fn restart(&self) -> Result<Transition, TransitionError> {
        self.require_phase("restart", &[Phase::Complete])?;
        Ok(Transition::settled(Self::new(
            self.id,
            Arc::clone(&self.passage),
            Arc::clone(&self.initial_questions),
        )))
    }

    /// Move past the end of the current section.
    ///
    /// Goes to the next section in order; after the last one the session completes,
    /// unless a jump left some earlier section unanswered, in which case reading
    /// resumes at the first such section.
    fn leave_section(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.section_index + 1 < self.passage.section_count() {
            self.enter_section(self.section_index + 1);
            return Ok(());
        }
        if self.pending.is_some() {
            return Err(TransitionError::EvaluationPending);
        }
        if let Some(index) = self.first_incomplete_section() {
            self.enter_section(index);
            return Ok(());
        }
        self.phase = Phase::Complete;
        self.completed_at = Some(now);
        Ok(())
    }

    fn enter_section(&mut self, index: usize) {
        self.section_index = index;
        self.visited.insert(index);
        self.question_index = 0;
        self.phase = Phase::Reading;
    }

    fn require_phase(&self, intent: &'static str, allowed: &[Phase]) -> Result<(), TransitionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(TransitionError::InvalidPhase {
                intent,
                phase: self.phase,
            })
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("section_index", &self.section_index)
            .field("question_index", &self.question_index)
            .field("answers_len", &self.answers.len())
            .field("visited", &self.visited)
            .field("pending", &self.pending.as_ref().map(|p| &p.question_id))
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}
