use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::compliance::{
    ActionKind, ComplianceDecision, ComplianceGuard, ProposedAction, RequiredAction, RuleCode,
};
use crate::config::EngineConfig;
use crate::domain::offer::{Offer, OfferStatus};
use crate::domain::session::{Session, VerificationStatus};
use crate::escalation::{EscalationArbiter, EscalationSignals, EscalationTrigger};
use crate::flows::engine::SessionFlow;
use crate::flows::states::{SessionEvent, SessionPhase};
use crate::negotiation::NegotiationPolicy;

/// The slice of loan state the engine needs for a turn. Loaded by the caller;
/// the engine never reaches into loan storage itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub balance: Decimal,
}

/// Structured signals extracted from the inbound borrower message. The engine
/// consumes these, never the raw text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BorrowerSignals {
    pub substantive: bool,
    pub opt_out_request: bool,
    pub validation_request: bool,
    pub human_request: bool,
    pub acceptance: bool,
    pub rejection: bool,
    pub distress: bool,
    pub stated_capacity: Option<Decimal>,
}

/// Result of an external collaborator call the caller ran this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalOutcome {
    Succeeded,
    Failed,
    Unavailable,
}

/// The outbound response the caller intends to send, as translated from the
/// language model's reply. Confidence is the model's own score; the engine
/// treats it as an opaque number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundDraft {
    pub kind: ActionKind,
    pub text: String,
    pub confidence: Option<f32>,
    pub escalation_requested: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReplyOutcome {
    Reply(OutboundDraft),
    Failed,
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    pub correlation_id: String,
    pub loan: LoanSnapshot,
    pub borrower: BorrowerSignals,
    pub verification: Option<ExternalOutcome>,
    pub payment: Option<ExternalOutcome>,
    pub reply: ReplyOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OutboundAction {
    Respond { kind: ActionKind, text: String },
    ProposeOffers { text: String, offers: Vec<Offer> },
    Refusal { rule: RuleCode },
    Handoff { trigger: EscalationTrigger },
    NoAction,
}

impl OutboundAction {
    /// A consummated outbound contact, as opposed to a refusal, hand-off, or
    /// terminal no-op. Only these record a ContactEvent.
    pub fn is_contact(&self) -> bool {
        matches!(self, Self::Respond { .. } | Self::ProposeOffers { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub session: Session,
    pub outbound: OutboundAction,
    pub decision: Option<ComplianceDecision>,
    pub escalation: Option<EscalationTrigger>,
}

/// Coordinates one turn: advances the session state machine, gates the
/// outbound action through the compliance guard, attaches negotiation offers,
/// and consults the escalation arbiter. Stateless across calls; the caller
/// persists the session returned in each TurnResult.
pub struct ConversationOrchestrator {
    guard: ComplianceGuard,
    policy: NegotiationPolicy,
    arbiter: EscalationArbiter,
    flow: SessionFlow,
}

impl ConversationOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            guard: ComplianceGuard::new(config.compliance),
            policy: NegotiationPolicy::new(config.negotiation),
            arbiter: EscalationArbiter::new(config.escalation),
            flow: SessionFlow,
        }
    }

    pub fn handle_turn(
        &self,
        session: Session,
        turn: &TurnInput,
        now: DateTime<Utc>,
        sink: &dyn AuditSink,
    ) -> TurnResult {
        let mut session = session;
        let audit = AuditContext::new(
            Some(session.id.clone()),
            Some(session.loan.clone()),
            turn.correlation_id.clone(),
            "conversation-orchestrator",
        );

        if session.is_terminal() {
            sink.emit(
                AuditEvent::new(
                    audit.session_id.clone(),
                    audit.loan_ref.clone(),
                    audit.correlation_id.clone(),
                    "turn.session_terminal",
                    AuditCategory::System,
                    audit.actor.clone(),
                    AuditOutcome::Rejected,
                )
                .with_metadata("phase", format!("{:?}", session.phase)),
            );
            return TurnResult {
                session,
                outbound: OutboundAction::NoAction,
                decision: None,
                escalation: None,
            };
        }

        if let Some(capacity) = turn.borrower.stated_capacity {
            session.stated_capacity = Some(capacity);
        }
        if turn.borrower.opt_out_request {
            session.opted_out = true;
        }
        if turn.borrower.validation_request {
            session.validation_pending = true;
        }

        let mut signals = EscalationSignals {
            explicit_request: turn.borrower.human_request,
            distress: turn.borrower.distress,
            ..EscalationSignals::default()
        };

        self.advance_phase(&mut session, turn, &mut signals, sink, &audit);

        let draft = match &turn.reply {
            ReplyOutcome::Reply(draft) => {
                signals.confidence = draft.confidence;
                if draft.escalation_requested {
                    signals.explicit_request = true;
                }
                Some(draft.clone())
            }
            ReplyOutcome::Failed | ReplyOutcome::TimedOut => {
                signals.external_failure = true;
                None
            }
        };

        let mut decision_out = None;
        let mut outbound = OutboundAction::NoAction;
        let mut pending_offers: Option<(String, Vec<Offer>)> = None;

        if let Some(mut draft) = draft {
            if turn.borrower.opt_out_request {
                draft.kind = ActionKind::AcknowledgeOptOut;
            } else if turn.borrower.validation_request {
                draft.kind = ActionKind::AcknowledgeValidation;
            }

            let proposed = ProposedAction { kind: draft.kind, text: draft.text };
            let decision = self.guard.evaluate(&session, &proposed, now);
            self.emit_decision(&decision, &proposed, sink, &audit);

            if decision.allowed {
                let text = match &decision.required_action {
                    RequiredAction::MaskContent { masked_text } => masked_text.clone(),
                    _ => proposed.text.clone(),
                };

                if self.should_attach_offers(&session, proposed.kind) {
                    let offers = self.policy.propose_offers(
                        turn.loan.balance,
                        session.stated_capacity,
                        &session.offers,
                        now,
                    );
                    if offers.is_empty() {
                        signals.offers_exhausted = true;
                    } else {
                        pending_offers = Some((text, offers));
                    }
                } else {
                    outbound = OutboundAction::Respond { kind: proposed.kind, text };
                }
            } else {
                if matches!(decision.required_action, RequiredAction::Escalate)
                    || session.phase == SessionPhase::Negotiation
                {
                    signals.compliance_block = true;
                }
                outbound = OutboundAction::Refusal {
                    rule: decision.first_violation().unwrap_or(RuleCode::ProhibitedContent),
                };
            }
            decision_out = Some(decision);
        }

        let escalation =
            if session.is_terminal() { None } else { self.arbiter.decide(&signals) };

        if let Some(trigger) = &escalation {
            self.advance(&mut session, SessionEvent::EscalationRequired(trigger.clone()), sink, &audit);
            session.escalated = Some(trigger.clone());
            sink.emit(
                AuditEvent::new(
                    audit.session_id.clone(),
                    audit.loan_ref.clone(),
                    audit.correlation_id.clone(),
                    "escalation.routed",
                    AuditCategory::Escalation,
                    audit.actor.clone(),
                    AuditOutcome::Success,
                )
                .with_metadata("trigger", trigger.as_str()),
            );
            outbound = OutboundAction::Handoff { trigger: trigger.clone() };
        } else if let Some((text, offers)) = pending_offers {
            session.offers.extend(offers.iter().cloned());
            sink.emit(
                AuditEvent::new(
                    audit.session_id.clone(),
                    audit.loan_ref.clone(),
                    audit.correlation_id.clone(),
                    "negotiation.offers_proposed",
                    AuditCategory::Negotiation,
                    audit.actor.clone(),
                    AuditOutcome::Success,
                )
                .with_metadata("count", offers.len().to_string()),
            );
            outbound = OutboundAction::ProposeOffers { text, offers };
        }

        if outbound.is_contact() {
            session.record_contact(now);
            sink.emit(
                AuditEvent::new(
                    audit.session_id.clone(),
                    audit.loan_ref.clone(),
                    audit.correlation_id.clone(),
                    "contact.recorded",
                    AuditCategory::Contact,
                    audit.actor.clone(),
                    AuditOutcome::Success,
                )
                .with_metadata("channel", format!("{:?}", session.channel)),
            );
        }

        TurnResult { session, outbound, decision: decision_out, escalation }
    }

    fn advance_phase(
        &self,
        session: &mut Session,
        turn: &TurnInput,
        signals: &mut EscalationSignals,
        sink: &dyn AuditSink,
        audit: &AuditContext,
    ) {
        if session.phase == SessionPhase::Greeting && turn.borrower.substantive {
            self.advance(session, SessionEvent::SubstantiveReply, sink, audit);
        }

        if session.phase == SessionPhase::Verification {
            match turn.verification {
                Some(ExternalOutcome::Succeeded) => {
                    session.verification = VerificationStatus::Verified;
                    self.advance(session, SessionEvent::VerificationSucceeded, sink, audit);
                }
                Some(ExternalOutcome::Failed) => {
                    session.verification_attempts += 1;
                    self.advance(session, SessionEvent::VerificationFailed, sink, audit);
                }
                Some(ExternalOutcome::Unavailable) => signals.external_failure = true,
                None => {}
            }
        }
        signals.verification_failures = session.verification_attempts;

        if session.phase == SessionPhase::Negotiation {
            if turn.borrower.rejection {
                if let Some(offer) = session.latest_proposed_offer_mut() {
                    offer.status = OfferStatus::Rejected;
                }
            } else if turn.borrower.acceptance {
                if let Some(offer) = session.latest_proposed_offer_mut() {
                    offer.status = OfferStatus::Accepted;
                    self.advance(session, SessionEvent::OfferAccepted, sink, audit);
                }
            }
        }

        if session.phase == SessionPhase::PaymentSetup {
            match turn.payment {
                Some(ExternalOutcome::Succeeded) => {
                    self.advance(session, SessionEvent::PaymentConfirmed, sink, audit);
                }
                Some(ExternalOutcome::Failed) | Some(ExternalOutcome::Unavailable) => {
                    signals.external_failure = true;
                }
                None => {}
            }
        }
    }

    /// Invalid (phase, event) pairs are audited and ignored; borrower input
    /// never faults a turn.
    fn advance(
        &self,
        session: &mut Session,
        event: SessionEvent,
        sink: &dyn AuditSink,
        audit: &AuditContext,
    ) {
        if let Ok(outcome) = self.flow.apply_with_audit(session.phase, &event, sink, audit) {
            session.phase = outcome.to;
        }
    }

    fn should_attach_offers(&self, session: &Session, kind: ActionKind) -> bool {
        session.phase == SessionPhase::Negotiation
            && !matches!(
                kind,
                ActionKind::AcknowledgeOptOut
                    | ActionKind::AcknowledgeValidation
                    | ActionKind::RequestVerification
                    | ActionKind::Close
            )
    }

    fn emit_decision(
        &self,
        decision: &ComplianceDecision,
        proposed: &ProposedAction,
        sink: &dyn AuditSink,
        audit: &AuditContext,
    ) {
        let outcome =
            if decision.allowed { AuditOutcome::Success } else { AuditOutcome::Rejected };
        let violations = decision
            .violations
            .iter()
            .map(RuleCode::as_str)
            .collect::<Vec<_>>()
            .join(",");

        sink.emit(
            AuditEvent::new(
                audit.session_id.clone(),
                audit.loan_ref.clone(),
                audit.correlation_id.clone(),
                "compliance.decision_evaluated",
                AuditCategory::Compliance,
                audit.actor.clone(),
                outcome,
            )
            .with_metadata("action_kind", format!("{:?}", proposed.kind))
            .with_metadata("violations", violations),
        );
    }
}
