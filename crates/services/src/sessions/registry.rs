use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use reading_core::model::{EvaluationResult, QuestionId, SessionId, SessionSummary};
use reading_core::session::{Effect, Intent, SessionState, TransitionError};

use crate::error::SessionError;
use super::workflow::SessionLoopService;

/// Isolated sessions keyed by id.
///
/// Each transition runs under the lock, so intents for one session are serialized.
/// The lock is released while an evaluation is awaited: the session can still be
/// navigated in the meantime, and the late result is applied to whatever state the
/// session has reached by then.
#[derive(Clone)]
pub struct SessionRegistry {
    service: SessionLoopService,
    sessions: Arc<Mutex<HashMap<SessionId, SessionState>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(service: SessionLoopService) -> Self {
        Self {
            service,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn service(&self) -> &SessionLoopService {
        &self.service
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionState>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|e| SessionError::Lock(e.to_string()))
    }

    /// Create a new session in the welcome phase and return its id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Lock` if the session store is poisoned.
    pub async fn create(&self) -> Result<SessionId, SessionError> {
        let state = self.service.new_session().await;
        let id = state.id();
        self.lock()?.insert(id, state);
        debug!(session = %id, "session created");
        Ok(id)
    }

    /// Current state of a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown ids.
    pub fn snapshot(&self, id: SessionId) -> Result<SessionState, SessionError> {
        self.lock()?
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    /// Drop a session. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Lock` if the session store is poisoned.
    pub fn remove(&self, id: SessionId) -> Result<bool, SessionError> {
        Ok(self.lock()?.remove(&id).is_some())
    }

    /// Number of live sessions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Lock` if the session store is poisoned.
    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Lock` if the session store is poisoned.
    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.lock()?.is_empty())
    }

    /// Resolve the question set and start the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown ids and `SessionError::Transition`
    /// if the session is not in the welcome phase.
    pub async fn start(&self, id: SessionId) -> Result<SessionState, SessionError> {
        let current = self.snapshot(id)?;
        let bank = self.service.resolve_questions(&current).await;
        self.dispatch(id, Intent::Start(bank)).await
    }

    /// Apply an intent to a session.
    ///
    /// `SubmitAnswer` also runs the evaluation and applies its result before
    /// returning. The evaluation runs on a spawned task: dropping the returned
    /// future does not leave the session waiting forever.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown ids, `SessionError::Transition`
    /// if the intent is rejected and `SessionError::EvaluationTask` if the
    /// evaluation task panicked.
    pub async fn dispatch(&self, id: SessionId, intent: Intent) -> Result<SessionState, SessionError> {
        let transition = {
            let mut sessions = self.lock()?;
            let state = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
            let transition = self.service.dispatch(state, intent)?;
            *state = transition.state.clone();
            transition
        };

        match transition.effect {
            None => Ok(transition.state),
            Some(Effect::Evaluate(pending)) => {
                // the result is applied by its own task, so it lands even if the caller goes away
                let registry = self.clone();
                let snapshot = transition.state;
                let task = tokio::spawn(async move {
                    let result = registry.service.evaluate(&snapshot, &pending).await;
                    registry.complete(id, pending.question_id, result)
                });
                task.await?
            }
        }
    }

    /// Submit an answer for the current question and wait for its evaluation.
    ///
    /// # Errors
    ///
    /// See [`SessionRegistry::dispatch`].
    pub async fn submit_answer(
        &self,
        id: SessionId,
        text: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        self.dispatch(id, Intent::SubmitAnswer(text.into())).await
    }

    fn complete(
        &self,
        id: SessionId,
        question_id: QuestionId,
        result: EvaluationResult,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.lock()?;
        let Some(state) = sessions.get_mut(&id) else {
            warn!(session = %id, question = %question_id, "evaluation finished for a removed session");
            return Err(SessionError::NotFound(id));
        };

        match self.service.complete(state, question_id.clone(), result) {
            Ok(next) => {
                *state = next.clone();
                Ok(next)
            }
            Err(SessionError::Transition(TransitionError::NoPendingEvaluation(_))) => {
                // the session is no longer waiting on this question
                warn!(session = %id, question = %question_id, "dropping stale evaluation result");
                Ok(state.clone())
            }
            Err(err) => Err(err),
        }
    }

    /// Summary of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown ids and `SessionError::Summary`
    /// if the session has not completed.
    pub fn summary(&self, id: SessionId) -> Result<SessionSummary, SessionError> {
        let state = self.snapshot(id)?;
        self.service.summary(&state)
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}
