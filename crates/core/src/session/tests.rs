use std::collections::BTreeSet;
use std::sync::Arc;

use super::*;
use crate::model::{
    Attempt, Difficulty, EvaluationResult, Passage, Question, QuestionBank, QuestionId, Score,
    Section, SessionId, SessionSummaryError,
};
use crate::time::fixed_now;

//
// ─── FIXTURES ──────────────────────────────────────────────────────────────────
//

fn passage() -> Arc<Passage> {
    Arc::new(
        Passage::new(
            "Bees",
            vec![
                Section::new("s1", "Hive", "The queen lays eggs."),
                Section::new("s2", "Workers", "Workers change jobs as they age."),
                Section::new("s3", "Dance", "The waggle dance points to food."),
            ],
        )
        .unwrap(),
    )
}

fn bank(passage: &Passage) -> QuestionBank {
    let q = |id: &str, section: &str| {
        Question::new(id, section, format!("Prompt {id}"), vec!["idea".into()], Difficulty::Analytical)
    };
    QuestionBank::new(
        vec![
            q("q1", "s1"),
            q("q2", "s1"),
            q("q3", "s2"),
            q("q4", "s2"),
            q("q5", "s3"),
            q("q6", "s3"),
        ],
        passage,
    )
    .unwrap()
}

fn welcome() -> SessionState {
    let passage = passage();
    let bank = Arc::new(bank(&passage));
    SessionState::new(SessionId::generate(), passage, bank)
}

fn apply(state: &SessionState, intent: Intent) -> SessionState {
    state.apply(intent, fixed_now()).unwrap().state
}

fn started() -> SessionState {
    let state = welcome();
    let bank = state.question_bank().clone();
    apply(&state, Intent::Start(bank))
}

fn result(score: Score) -> EvaluationResult {
    EvaluationResult::new(score, "assessment", "improvement")
}

/// Submit and immediately complete an evaluation for the current question.
fn answer(state: &SessionState, text: &str, score: Score) -> SessionState {
    let transition = state
        .apply(Intent::SubmitAnswer(text.into()), fixed_now())
        .unwrap();
    let Some(Effect::Evaluate(pending)) = transition.effect else {
        panic!("submit should request an evaluation");
    };
    apply(
        &transition.state,
        Intent::EvaluationCompleted {
            question_id: pending.question_id,
            result: result(score),
        },
    )
}

/// Walk a whole session answering each question once with the given scores.
fn run_through(scores: &[Score]) -> SessionState {
    let mut state = started();
    let mut scores = scores.iter();
    while !state.is_complete() {
        state = match state.phase() {
            Phase::Reading => apply(&state, Intent::FinishedReading),
            Phase::Questions => answer(&state, "my answer", *scores.next().unwrap()),
            Phase::Feedback => apply(&state, Intent::Next),
            other => panic!("unexpected phase {other}"),
        };
    }
    state
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

#[test]
fn start_moves_to_reading_with_reset_indices() {
    let state = started();
    assert_eq!(state.phase(), Phase::Reading);
    assert_eq!(state.section_index(), 0);
    assert_eq!(state.question_index(), 0);
    assert_eq!(state.visited_sections(), &BTreeSet::from([0]));
    assert_eq!(state.started_at(), Some(fixed_now()));
}

#[test]
fn start_is_only_valid_on_welcome() {
    let state = started();
    let bank = state.question_bank().clone();
    let err = state.apply(Intent::Start(bank), fixed_now()).unwrap_err();
    assert!(matches!(err, TransitionError::InvalidPhase { intent: "start", .. }));
}

#[test]
fn submit_returns_pending_effect_and_stays_in_phase() {
    let state = apply(&started(), Intent::FinishedReading);
    let transition = state
        .apply(Intent::SubmitAnswer("the queen lays eggs".into()), fixed_now())
        .unwrap();

    assert_eq!(transition.state.phase(), Phase::Questions);
    assert!(transition.state.is_evaluating());
    assert_eq!(
        transition.effect,
        Some(Effect::Evaluate(PendingEvaluation {
            question_id: QuestionId::new("q1"),
            section_index: 0,
            attempt: Attempt::First,
            answer: "the queen lays eggs".into(),
            previous_answer: None,
        }))
    );
    assert_eq!(transition.state.answered_count(), 0);
}

#[test]
fn completed_evaluation_stores_first_attempt_and_shows_feedback() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "eggs", Score::Partial);

    assert_eq!(state.phase(), Phase::Feedback);
    let record = state.answer(&QuestionId::new("q1")).unwrap();
    assert_eq!(record.attempt, Attempt::First);
    assert_eq!(record.answer, "eggs");
    assert_eq!(record.result.score, Score::Partial);
    assert!(!state.is_evaluating());
}

#[test]
fn blank_answers_never_leave_the_phase() {
    let state = apply(&started(), Intent::FinishedReading);
    for blank in ["", "   ", "\n\t"] {
        let err = state
            .apply(Intent::SubmitAnswer(blank.into()), fixed_now())
            .unwrap_err();
        assert_eq!(err, TransitionError::EmptyAnswer);
    }
    assert_eq!(state.phase(), Phase::Questions);
    assert!(!state.is_evaluating());
}

#[test]
fn second_submit_while_pending_is_rejected() {
    let state = apply(&started(), Intent::FinishedReading);
    let pending = apply(&state, Intent::SubmitAnswer("first".into()));
    let err = pending
        .apply(Intent::SubmitAnswer("again".into()), fixed_now())
        .unwrap_err();
    assert_eq!(err, TransitionError::EvaluationPending);
}

#[test]
fn retry_overwrites_record_with_second_attempt() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "first try", Score::Incorrect);
    assert!(state.can_try_again());

    let state = apply(&state, Intent::TryAgain);
    assert_eq!(state.phase(), Phase::Retry);
    assert_eq!(state.input(), "");

    let transition = state
        .apply(Intent::SubmitAnswer("better try".into()), fixed_now())
        .unwrap();
    let Some(Effect::Evaluate(pending)) = &transition.effect else {
        panic!("expected evaluation effect");
    };
    assert_eq!(pending.attempt, Attempt::Second);
    assert_eq!(pending.previous_answer.as_deref(), Some("first try"));

    let state = apply(
        &transition.state,
        Intent::EvaluationCompleted {
            question_id: QuestionId::new("q1"),
            result: result(Score::Correct),
        },
    );
    let record = state.answer(&QuestionId::new("q1")).unwrap();
    assert_eq!(record.attempt, Attempt::Second);
    assert_eq!(record.answer, "better try");
    assert_eq!(state.answers().len(), 1);
    assert_eq!(state.phase(), Phase::Feedback);
}

#[test]
fn no_third_attempt_after_second_feedback() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "one", Score::Incorrect);
    let state = apply(&state, Intent::TryAgain);
    let state = answer(&state, "two", Score::Incorrect);

    assert!(!state.can_try_again());
    assert_eq!(
        state.apply(Intent::TryAgain, fixed_now()).unwrap_err(),
        TransitionError::RetryNotAllowed
    );
    assert!(matches!(
        state.apply(Intent::SubmitAnswer("three".into()), fixed_now()),
        Err(TransitionError::InvalidPhase { .. })
    ));
}

#[test]
fn try_again_is_not_offered_after_correct_answer() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "perfect", Score::Correct);
    assert!(!state.can_try_again());
    assert_eq!(
        state.apply(Intent::TryAgain, fixed_now()).unwrap_err(),
        TransitionError::RetryNotAllowed
    );
}

#[test]
fn next_follows_advancement_rule() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "a", Score::Correct);
    assert_eq!(state.next_step(), Some(NextStep::NextQuestion));

    let state = apply(&state, Intent::Next);
    assert_eq!(state.phase(), Phase::Questions);
    assert_eq!(state.question_index(), 1);

    let state = answer(&state, "b", Score::Correct);
    assert_eq!(state.next_step(), Some(NextStep::NextSection));
    let state = apply(&state, Intent::Next);
    assert_eq!(state.phase(), Phase::Reading);
    assert_eq!(state.section_index(), 1);
    assert_eq!(state.question_index(), 0);
    assert!(state.visited_sections().contains(&1));
}

#[test]
fn completing_every_question_reaches_complete() {
    let state = run_through(&[Score::Correct; 6]);
    assert_eq!(state.phase(), Phase::Complete);
    assert_eq!(state.answered_count(), 6);
    assert_eq!(state.completed_at(), Some(fixed_now()));
    for question in state.question_bank().questions() {
        assert!(state.answer(&question.id).is_some());
    }
}

#[test]
fn completion_percent_matches_weighted_scores() {
    let state = run_through(&[
        Score::Correct,
        Score::Correct,
        Score::Partial,
        Score::Incorrect,
        Score::Correct,
        Score::Partial,
    ]);
    let tally = state.score_tally();
    assert_eq!((tally.correct, tally.partial, tally.incorrect), (3, 2, 1));
    assert_eq!(state.completion_percent(), 67);

    let summary = state.summary().unwrap();
    assert_eq!(summary.completion_percent(), 67);
    assert_eq!(summary.reviews().len(), 6);
    assert_eq!(summary.reviews()[0].question_id, QuestionId::new("q1"));
}

#[test]
fn answered_count_never_decreases_until_restart() {
    let mut state = started();
    let mut last = 0;
    while !state.is_complete() {
        state = match state.phase() {
            Phase::Reading => apply(&state, Intent::FinishedReading),
            Phase::Questions => answer(&state, "x", Score::Incorrect),
            Phase::Feedback if state.can_try_again() && state.question_index() == 0 => {
                apply(&state, Intent::TryAgain)
            }
            Phase::Retry => answer(&state, "y", Score::Partial),
            Phase::Feedback => apply(&state, Intent::Next),
            other => panic!("unexpected phase {other}"),
        };
        assert!(state.answered_count() >= last);
        last = state.answered_count();
    }

    let state = apply(&state, Intent::Restart);
    assert_eq!(state.answered_count(), 0);
}

#[test]
fn restart_resets_everything() {
    let state = run_through(&[Score::Partial; 6]);
    let id = state.id();
    let state = apply(&state, Intent::Restart);

    assert_eq!(state.phase(), Phase::Welcome);
    assert_eq!(state.id(), id);
    assert!(state.answers().is_empty());
    assert_eq!(state.section_index(), 0);
    assert_eq!(state.question_index(), 0);
    assert_eq!(state.visited_sections(), &BTreeSet::from([0]));
    assert_eq!(state.started_at(), None);
    assert!(matches!(state.summary(), Err(SessionSummaryError::NotComplete)));
}

#[test]
fn restart_returns_to_initial_questions() {
    let state = welcome();
    let initial = state.question_bank().clone();
    let replacement = QuestionBank::new(
        vec![
            Question::new("g1", "s1", "Who lays eggs?", vec![], Difficulty::Foundational),
            Question::new("g2", "s3", "What does the dance show?", vec![], Difficulty::Inferential),
        ],
        state.passage(),
    )
    .unwrap();

    let mut state = apply(&state, Intent::Start(replacement.clone()));
    assert_eq!(state.question_bank(), &replacement);
    assert_eq!(state.initial_questions(), &initial);
    while !state.is_complete() {
        state = match state.phase() {
            Phase::Reading => apply(&state, Intent::FinishedReading),
            Phase::Questions => answer(&state, "x", Score::Correct),
            Phase::Feedback => apply(&state, Intent::Next),
            other => panic!("unexpected phase {other}"),
        };
    }

    let state = apply(&state, Intent::Restart);
    assert_eq!(state.question_bank(), &initial);
    assert_eq!(state.question_bank().total(), 6);
}

#[test]
fn restart_is_only_valid_when_complete() {
    let state = started();
    assert!(matches!(
        state.apply(Intent::Restart, fixed_now()),
        Err(TransitionError::InvalidPhase { intent: "restart", .. })
    ));
}

//
// ─── NAVIGATION ────────────────────────────────────────────────────────────────
//

#[test]
fn jump_preserves_answers_and_revisit_starts_at_first_question() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "a", Score::Correct);
    let state = apply(&state, Intent::Next);
    assert_eq!(state.question_index(), 1);

    let state = apply(&state, Intent::JumpToSection(2));
    assert_eq!(state.phase(), Phase::Reading);
    assert_eq!(state.section_index(), 2);
    assert_eq!(state.visited_sections(), &BTreeSet::from([0, 2]));
    assert!(state.answer(&QuestionId::new("q1")).is_some());

    let state = apply(&state, Intent::JumpToSection(0));
    let state = apply(&state, Intent::FinishedReading);
    assert_eq!(state.phase(), Phase::Questions);
    assert_eq!(state.question_index(), 0);
    assert_eq!(
        state.answer(&QuestionId::new("q1")).unwrap().result.score,
        Score::Correct
    );
}

#[test]
fn jump_rejects_out_of_range_and_invalid_phases() {
    let state = started();
    assert_eq!(
        state.apply(Intent::JumpToSection(3), fixed_now()).unwrap_err(),
        TransitionError::SectionOutOfRange { index: 3, count: 3 }
    );
    assert!(matches!(
        welcome().apply(Intent::JumpToSection(1), fixed_now()),
        Err(TransitionError::InvalidPhase { .. })
    ));
}

#[test]
fn late_result_lands_on_its_own_question_after_navigation() {
    let state = apply(&started(), Intent::FinishedReading);
    let pending = apply(&state, Intent::SubmitAnswer("eggs".into()));
    let moved = apply(&pending, Intent::JumpToSection(1));
    let moved = apply(&moved, Intent::FinishedReading);
    assert_eq!(moved.current_question().unwrap().id, QuestionId::new("q3"));

    let resolved = apply(
        &moved,
        Intent::EvaluationCompleted {
            question_id: QuestionId::new("q1"),
            result: result(Score::Correct),
        },
    );

    assert_eq!(resolved.phase(), Phase::Questions);
    assert!(resolved.answer(&QuestionId::new("q1")).is_some());
    assert!(resolved.answer(&QuestionId::new("q3")).is_none());
    assert!(!resolved.is_evaluating());
}

#[test]
fn submitting_in_another_section_waits_for_pending_result() {
    let state = apply(&started(), Intent::FinishedReading);
    let pending = apply(&state, Intent::SubmitAnswer("eggs".into()));
    let moved = apply(&pending, Intent::JumpToSection(1));
    let moved = apply(&moved, Intent::FinishedReading);
    assert_eq!(
        moved
            .apply(Intent::SubmitAnswer("workers".into()), fixed_now())
            .unwrap_err(),
        TransitionError::EvaluationPending
    );
}

#[test]
fn stale_completion_is_rejected() {
    let state = apply(&started(), Intent::FinishedReading);
    let err = state
        .apply(
            Intent::EvaluationCompleted {
                question_id: QuestionId::new("q1"),
                result: result(Score::Correct),
            },
            fixed_now(),
        )
        .unwrap_err();
    assert_eq!(err, TransitionError::NoPendingEvaluation(QuestionId::new("q1")));
}

#[test]
fn answered_question_can_be_skipped_but_not_resubmitted() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "a", Score::Partial);
    let state = apply(&state, Intent::JumpToSection(0));
    let state = apply(&state, Intent::FinishedReading);

    assert_eq!(
        state
            .apply(Intent::SubmitAnswer("again".into()), fixed_now())
            .unwrap_err(),
        TransitionError::AlreadyAnswered(QuestionId::new("q1"))
    );

    let state = apply(&state, Intent::Next);
    assert_eq!(state.question_index(), 1);
    assert_eq!(
        state.apply(Intent::Next, fixed_now()).unwrap_err(),
        TransitionError::NotAnswered(QuestionId::new("q2"))
    );
}

#[test]
fn skipping_sections_returns_to_first_unanswered_before_completing() {
    let state = started();
    let state = apply(&state, Intent::JumpToSection(2));
    let state = apply(&state, Intent::FinishedReading);
    let state = answer(&state, "a", Score::Correct);
    let state = apply(&state, Intent::Next);
    let state = answer(&state, "b", Score::Correct);
    let state = apply(&state, Intent::Next);

    assert_eq!(state.phase(), Phase::Reading);
    assert_eq!(state.section_index(), 0);
}

#[test]
fn section_without_questions_is_skipped_after_reading() {
    let passage = passage();
    let bank = QuestionBank::new(
        vec![Question::new("only", "s3", "Why?", Vec::new(), Difficulty::Inferential)],
        &passage,
    )
    .unwrap();
    let state = SessionState::new(SessionId::generate(), passage, Arc::new(bank.clone()));
    let state = apply(&state, Intent::Start(bank));

    let state = apply(&state, Intent::FinishedReading);
    assert_eq!(state.phase(), Phase::Reading);
    assert_eq!(state.section_index(), 1);
    assert!(state.section_fully_answered(0));
}

#[test]
fn input_is_cleared_on_jump() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = apply(&state, Intent::UpdateInput("draft".into()));
    assert_eq!(state.input(), "draft");

    let jumped = apply(&state, Intent::JumpToSection(1));
    assert_eq!(jumped.input(), "");
    assert!(matches!(
        jumped.apply(Intent::UpdateInput("x".into()), fixed_now()),
        Err(TransitionError::InvalidPhase { .. })
    ));
}

//
// ─── PROJECTIONS ───────────────────────────────────────────────────────────────
//

#[test]
fn progress_and_section_statuses_track_answers() {
    let state = apply(&started(), Intent::FinishedReading);
    let state = answer(&state, "a", Score::Correct);
    let state = apply(&state, Intent::Next);
    let state = answer(&state, "b", Score::Incorrect);
    let state = apply(&state, Intent::Next);

    let progress = state.progress();
    assert_eq!(progress.total, 6);
    assert_eq!(progress.answered, 2);
    assert_eq!(progress.remaining, 4);
    assert!((progress.percent - 100.0 / 3.0).abs() < 1e-9);

    assert_eq!(
        state.section_statuses(),
        vec![
            SectionStatus::Answered,
            SectionStatus::Current,
            SectionStatus::Unvisited
        ]
    );
    let state = apply(&state, Intent::JumpToSection(2));
    assert_eq!(state.section_status(1), SectionStatus::Visited);
}

#[test]
fn no_answer_result_counts_as_incorrect() {
    let state = apply(&started(), Intent::FinishedReading);
    let pending = apply(&state, Intent::SubmitAnswer("x".into()));
    let state = apply(
        &pending,
        Intent::EvaluationCompleted {
            question_id: QuestionId::new("q1"),
            result: EvaluationResult::no_answer(),
        },
    );
    assert_eq!(state.score_tally().incorrect, 1);
    assert_eq!(state.answered_count(), 1);
}

#[test]
fn summary_is_unavailable_before_completion() {
    assert!(matches!(
        started().summary(),
        Err(SessionSummaryError::NotComplete)
    ));
}
