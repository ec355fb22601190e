use std::sync::Arc;

use tracing::{info, warn};

use reading_content::{BundledContent, ContentError, ContentProvider};
use reading_core::model::{
    EvaluationResult, Passage, QuestionBank, QuestionId, SessionId, SessionSummary,
};
use reading_core::session::{Effect, Intent, PendingEvaluation, SessionState, Transition};

use crate::Clock;
use crate::config::SessionConfig;
use crate::error::{EvaluatorError, QuestionGenError, SessionError};
use crate::evaluator::{EvaluationRequest, Evaluator};
use crate::question_generator::{GenerationRequest, QuestionGenerator};

/// Drives a single reading session: content loading, question resolution,
/// and evaluation round-trips around the pure state machine.
///
/// Collaborator failures never surface as errors here; they degrade to the
/// bundled questions or a placeholder evaluation result.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    fallback: Arc<BundledContent>,
    content: Arc<dyn ContentProvider>,
    evaluator: Arc<dyn Evaluator>,
    generator: Option<Arc<dyn QuestionGenerator>>,
    config: SessionConfig,
}

impl SessionLoopService {
    /// Build a service that reads the bundled passage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Content` if the bundled content fails validation.
    pub fn new(clock: Clock, evaluator: Arc<dyn Evaluator>) -> Result<Self, SessionError> {
        let fallback = Arc::new(BundledContent::new()?);
        Ok(Self {
            clock,
            content: fallback.clone(),
            fallback,
            evaluator,
            generator: None,
            config: SessionConfig::default(),
        })
    }

    #[must_use]
    pub fn with_content(mut self, content: Arc<dyn ContentProvider>) -> Self {
        self.content = content;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Create a session in the welcome phase.
    ///
    /// Uses the configured content provider, or the bundled passage and questions
    /// if the provider fails or its questions do not fit its passage.
    pub async fn new_session(&self) -> SessionState {
        let (passage, questions) = match self.load_content().await {
            Ok(content) => content,
            Err(err) => {
                warn!(%err, "content provider failed, using bundled passage");
                self.bundled()
            }
        };
        SessionState::new(SessionId::generate(), passage, Arc::new(questions))
    }

    async fn load_content(&self) -> Result<(Arc<Passage>, QuestionBank), SessionError> {
        let passage = self.content.passage().await?;
        let questions = self.content.questions().await?;
        let bank = QuestionBank::new(questions, &passage).map_err(ContentError::from)?;
        Ok((passage, bank))
    }

    fn bundled(&self) -> (Arc<Passage>, QuestionBank) {
        (self.fallback.passage_arc(), self.fallback.question_bank().clone())
    }

    /// Pick the question set for `Start`.
    ///
    /// Generated questions are used when generation is enabled and succeeds in time;
    /// otherwise the session gets the questions it was created with, which are the
    /// bundled set unless a content provider supplied its own.
    pub async fn resolve_questions(&self, state: &SessionState) -> QuestionBank {
        let Some(generator) = self.generator.as_ref().filter(|_| self.config.generate_questions)
        else {
            return state.initial_questions().clone();
        };

        match self.generate(generator.as_ref(), state.passage()).await {
            Ok(bank) => {
                info!(session = %state.id(), questions = bank.total(), "using generated questions");
                bank
            }
            Err(err) => {
                warn!(session = %state.id(), %err, "question generation failed, using pre-generated questions");
                state.initial_questions().clone()
            }
        }
    }

    async fn generate(
        &self,
        generator: &dyn QuestionGenerator,
        passage: &Passage,
    ) -> Result<QuestionBank, QuestionGenError> {
        let request = GenerationRequest::from_passage(passage);
        let limit = self.config.evaluation_timeout;
        let questions = tokio::time::timeout(limit, generator.generate(&request))
            .await
            .map_err(|_| QuestionGenError::TimedOut(limit))??;
        if questions.is_empty() {
            return Err(QuestionGenError::Empty);
        }
        Ok(QuestionBank::new(questions, passage)?)
    }

    /// Resolve questions and apply `Start`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the session is not in the welcome phase.
    pub async fn start(&self, state: &SessionState) -> Result<SessionState, SessionError> {
        let bank = self.resolve_questions(state).await;
        Ok(self.dispatch(state, Intent::Start(bank))?.state)
    }

    /// Apply an intent at the current clock time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the state machine rejects the intent.
    pub fn dispatch(&self, state: &SessionState, intent: Intent) -> Result<Transition, SessionError> {
        Ok(state.apply(intent, self.clock.now())?)
    }

    /// Submit an answer and wait for its evaluation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the submission is rejected
    /// (wrong phase, blank text, evaluation already pending).
    pub async fn submit_answer(
        &self,
        state: &SessionState,
        text: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        let transition = self.dispatch(state, Intent::SubmitAnswer(text.into()))?;
        match transition.effect {
            Some(Effect::Evaluate(pending)) => {
                let result = self.evaluate(&transition.state, &pending).await;
                self.complete(&transition.state, pending.question_id, result)
            }
            None => Ok(transition.state),
        }
    }

    /// Run the evaluator for a pending answer.
    ///
    /// Never fails: errors and timeouts yield [`EvaluationResult::unavailable`].
    pub async fn evaluate(&self, state: &SessionState, pending: &PendingEvaluation) -> EvaluationResult {
        let question = state.question_bank().get(&pending.question_id);
        let section = state.passage().section(pending.section_index);
        let (Some(question), Some(section)) = (question, section) else {
            warn!(session = %state.id(), question = %pending.question_id, "pending evaluation has no matching question");
            return EvaluationResult::unavailable();
        };

        let request = EvaluationRequest::from_pending(pending, question, section);
        match self.run_evaluator(&request).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    session = %state.id(),
                    question = %pending.question_id,
                    attempt = pending.attempt.number(),
                    %err,
                    "evaluation failed, using placeholder result"
                );
                EvaluationResult::unavailable()
            }
        }
    }

    async fn run_evaluator(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        let limit = self.config.evaluation_timeout;
        tokio::time::timeout(limit, self.evaluator.evaluate(request))
            .await
            .map_err(|_| EvaluatorError::TimedOut(limit))?
    }

    /// Feed an evaluation result back into the state machine.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if no evaluation is pending for `question_id`.
    pub fn complete(
        &self,
        state: &SessionState,
        question_id: QuestionId,
        result: EvaluationResult,
    ) -> Result<SessionState, SessionError> {
        let transition = self.dispatch(
            state,
            Intent::EvaluationCompleted {
                question_id,
                result,
            },
        )?;
        Ok(transition.state)
    }

    /// Summary of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the session has not completed.
    pub fn summary(&self, state: &SessionState) -> Result<SessionSummary, SessionError> {
        Ok(state.summary()?)
    }
}

impl std::fmt::Debug for SessionLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLoopService")
            .field("clock", &self.clock)
            .field("generator", &self.generator.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
