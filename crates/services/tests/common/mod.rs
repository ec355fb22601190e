#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reading_core::model::{EvaluationResult, Question, Score};
use reading_core::session::{Phase, SessionState};
use reading_core::time::fixed_clock;
use services::error::AiError;
use services::{
    EvaluationRequest, Evaluator, EvaluatorError, GenerationRequest, QuestionGenError,
    QuestionGenerator, SessionLoopService,
};
use tokio::sync::Notify;

/// Returns scripted scores in order, repeating the last one, and records requests.
#[derive(Default)]
pub struct ScriptedEvaluator {
    scores: Vec<Score>,
    pub requests: Mutex<Vec<EvaluationRequest>>,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new(scores: Vec<Score>) -> Self {
        Self {
            scores,
            ..Self::default()
        }
    }

    pub fn always(score: Score) -> Self {
        Self::new(vec![score])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let score = self
            .scores
            .get(call)
            .or_else(|| self.scores.last())
            .copied()
            .unwrap_or(Score::Correct);
        Ok(EvaluationResult::new(score, "graded", "keep going"))
    }
}

pub struct FailingEvaluator;

#[async_trait]
impl Evaluator for FailingEvaluator {
    async fn evaluate(&self, _request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        Err(EvaluatorError::Ai(AiError::EmptyResponse))
    }
}

pub struct SlowEvaluator(pub Duration);

#[async_trait]
impl Evaluator for SlowEvaluator {
    async fn evaluate(&self, _request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        tokio::time::sleep(self.0).await;
        Ok(EvaluationResult::new(Score::Correct, "late", "late"))
    }
}

/// Blocks until released, so tests can act while an evaluation is in flight.
#[derive(Default)]
pub struct GatedEvaluator {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl Evaluator for GatedEvaluator {
    async fn evaluate(&self, _request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(EvaluationResult::new(Score::Correct, "worth the wait", "none"))
    }
}

pub enum GeneratorBehavior {
    Fail,
    Empty,
    Return(Vec<Question>),
}

pub struct StubGenerator {
    behavior: GeneratorBehavior,
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionGenerator for StubGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<Question>, QuestionGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            GeneratorBehavior::Fail => Err(QuestionGenError::Ai(AiError::Disabled)),
            GeneratorBehavior::Empty => Ok(Vec::new()),
            GeneratorBehavior::Return(questions) => Ok(questions.clone()),
        }
    }
}

pub fn service(evaluator: Arc<dyn Evaluator>) -> SessionLoopService {
    SessionLoopService::new(fixed_clock(), evaluator).unwrap()
}

/// Answer every question once with `answer`, reading and advancing as needed.
pub async fn run_to_completion(service: &SessionLoopService, mut state: SessionState) -> SessionState {
    while !state.is_complete() {
        state = match state.phase() {
            Phase::Reading => {
                service
                    .dispatch(&state, reading_core::session::Intent::FinishedReading)
                    .unwrap()
                    .state
            }
            Phase::Questions => service.submit_answer(&state, "an answer").await.unwrap(),
            Phase::Feedback => {
                service
                    .dispatch(&state, reading_core::session::Intent::Next)
                    .unwrap()
                    .state
            }
            other => panic!("unexpected phase {other}"),
        };
    }
    state
}
