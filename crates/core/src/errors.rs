use thiserror::Error;

use crate::flows::engine::PhaseTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    PhaseTransition(#[from] PhaseTransitionError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Boundary-level failures. Compliance violations and exhausted offer sets
/// are ordinary data, never errors; external call failures reach the engine
/// as input signals, so this taxonomy covers caller-side plumbing only.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};
    use crate::flows::engine::PhaseTransitionError;
    use crate::flows::states::{SessionEvent, SessionPhase};

    #[test]
    fn transition_errors_lift_into_the_application_taxonomy() {
        let error: ApplicationError = DomainError::from(PhaseTransitionError::InvalidTransition {
            phase: SessionPhase::Greeting,
            event: SessionEvent::OfferAccepted,
        })
        .into();

        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::PhaseTransition(
                PhaseTransitionError::InvalidTransition { phase: SessionPhase::Greeting, .. }
            ))
        ));
    }

    #[test]
    fn persistence_failures_render_with_context() {
        let error = ApplicationError::Persistence("session store unavailable".to_string());
        assert_eq!(error.to_string(), "persistence failure: session store unavailable");
    }
}
