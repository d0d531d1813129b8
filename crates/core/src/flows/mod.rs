pub mod engine;
pub mod states;

pub use engine::{PhaseTransitionError, SessionFlow};
pub use states::{PhaseAction, SessionEvent, SessionPhase, TransitionOutcome};
