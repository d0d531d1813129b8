pub mod audit;
pub mod compliance;
pub mod config;
pub mod domain;
pub mod errors;
pub mod escalation;
pub mod flows;
pub mod negotiation;
pub mod orchestrator;
pub mod ports;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use compliance::{
    ActionKind, ComplianceDecision, ComplianceGuard, ProposedAction, RequiredAction, RuleCode,
};
pub use config::{
    ComplianceConfig, ConfigError, EngineConfig, EscalationConfig, LoadOptions, LogFormat,
    NegotiationConfig, ProhibitedPhrase,
};
pub use domain::offer::{Offer, OfferId, OfferKind, OfferStatus};
pub use domain::session::{
    BorrowerRef, Channel, ContactEvent, LoanRef, Session, SessionId, VerificationStatus,
};
pub use errors::{ApplicationError, DomainError};
pub use escalation::{EscalationArbiter, EscalationSignals, EscalationTrigger};
pub use flows::{PhaseTransitionError, SessionEvent, SessionFlow, SessionPhase};
pub use negotiation::NegotiationPolicy;
pub use orchestrator::{
    BorrowerSignals, ConversationOrchestrator, ExternalOutcome, LoanSnapshot, OutboundAction,
    OutboundDraft, ReplyOutcome, TurnInput, TurnResult,
};
pub use ports::{InMemorySessionStore, SessionStore, StoreError};
