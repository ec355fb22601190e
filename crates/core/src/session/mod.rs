//! Reading session state machine.
//!
//! `welcome → reading → questions → feedback (→ retry → feedback) → … → complete`
//!
//! Every transition is a pure function of the current [`SessionState`] and an
//! [`Intent`]. Evaluation is modelled as an [`Effect`]: submitting an answer marks
//! it pending and hands the request back to the caller, who later feeds the result in
//! with [`Intent::EvaluationCompleted`].

mod intent;
mod progress;
mod state;

#[cfg(test)]
mod tests;

pub use intent::{Effect, Intent, PendingEvaluation, Phase, TransitionError};
pub use progress::{NextStep, SectionStatus, SessionProgress};
pub use state::{SessionState, Transition};
