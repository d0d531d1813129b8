use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::states::{PhaseAction, SessionEvent, SessionPhase, TransitionOutcome};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PhaseTransitionError {
    #[error("phase {phase:?} is terminal and accepts no further events")]
    TerminalPhase { phase: SessionPhase },
    #[error("invalid transition from {phase:?} using event {event:?}")]
    InvalidTransition { phase: SessionPhase, event: SessionEvent },
}

/// The single conversation flow. Phases advance monotonically toward
/// `Closed`; `Escalated` is reachable from every non-terminal phase and,
/// like `Closed`, accepts no further events.
#[derive(Clone, Debug, Default)]
pub struct SessionFlow;

impl SessionFlow {
    pub fn initial_phase(&self) -> SessionPhase {
        SessionPhase::Greeting
    }

    pub fn apply(
        &self,
        current: SessionPhase,
        event: &SessionEvent,
    ) -> Result<TransitionOutcome, PhaseTransitionError> {
        transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: SessionPhase,
        event: &SessionEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, PhaseTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.session_id.clone(),
                        audit.loan_ref.clone(),
                        audit.correlation_id.clone(),
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.session_id.clone(),
                        audit.loan_ref.clone(),
                        audit.correlation_id.clone(),
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

fn transition(
    current: SessionPhase,
    event: &SessionEvent,
) -> Result<TransitionOutcome, PhaseTransitionError> {
    use PhaseAction::{
        ConfirmClosure, EvaluateOffers, InitiatePaymentPlan, RequestVerification, RouteToHuman,
    };
    use SessionEvent::{
        EscalationRequired, OfferAccepted, PaymentConfirmed, SubstantiveReply, VerificationFailed,
        VerificationSucceeded,
    };
    use SessionPhase::{Closed, Escalated, Greeting, Negotiation, PaymentSetup, Verification};

    if matches!(current, Escalated | Closed) {
        return Err(PhaseTransitionError::TerminalPhase { phase: current });
    }

    let (to, actions) = match (current, event) {
        (Greeting, SubstantiveReply) => (Verification, vec![RequestVerification]),
        (Verification, VerificationSucceeded) => (Negotiation, vec![EvaluateOffers]),
        (Verification, VerificationFailed) => (Verification, Vec::new()),
        (Negotiation, OfferAccepted) => (PaymentSetup, vec![InitiatePaymentPlan]),
        (PaymentSetup, PaymentConfirmed) => (Closed, vec![ConfirmClosure]),
        (_, EscalationRequired(_)) => (Escalated, vec![RouteToHuman]),
        _ => {
            return Err(PhaseTransitionError::InvalidTransition {
                phase: current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current, to, event: event.clone(), actions })
}
