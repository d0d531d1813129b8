use serde::{Deserialize, Serialize};

use crate::escalation::EscalationTrigger;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Greeting,
    Verification,
    Negotiation,
    PaymentSetup,
    Closed,
    Escalated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    SubstantiveReply,
    VerificationSucceeded,
    VerificationFailed,
    OfferAccepted,
    PaymentConfirmed,
    EscalationRequired(EscalationTrigger),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseAction {
    RequestVerification,
    EvaluateOffers,
    InitiatePaymentPlan,
    ConfirmClosure,
    RouteToHuman,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub event: SessionEvent,
    pub actions: Vec<PhaseAction>,
}
