use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::Offer;
use crate::escalation::EscalationTrigger;
use crate::flows::states::SessionPhase;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanRef(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorrowerRef(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Chat,
    Sms,
    Email,
    Voice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    Verified,
}

/// One consummated outbound contact. Append-only; frequency rules count these
/// over rolling windows, so an event is never rewritten or removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub session_id: SessionId,
    pub channel: Channel,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub loan: LoanRef,
    pub borrower: BorrowerRef,
    pub phase: SessionPhase,
    pub verification: VerificationStatus,
    pub verification_attempts: u32,
    pub channel: Channel,
    pub created_at: DateTime<Utc>,
    pub last_contact_at: Option<DateTime<Utc>>,
    pub contact_history: Vec<ContactEvent>,
    pub offers: Vec<Offer>,
    pub stated_capacity: Option<Decimal>,
    pub opted_out: bool,
    pub validation_pending: bool,
    pub escalated: Option<EscalationTrigger>,
    /// Borrower-local wall clock = UTC + this offset. Only the contact-hours
    /// rule reads it; all stored timestamps stay UTC.
    pub local_offset_minutes: i32,
}

impl Session {
    pub fn new(
        id: SessionId,
        loan: LoanRef,
        borrower: BorrowerRef,
        channel: Channel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            loan,
            borrower,
            phase: SessionPhase::Greeting,
            verification: VerificationStatus::Unverified,
            verification_attempts: 0,
            channel,
            created_at,
            last_contact_at: None,
            contact_history: Vec::new(),
            offers: Vec::new(),
            stated_capacity: None,
            opted_out: false,
            validation_pending: false,
            escalated: None,
            local_offset_minutes: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::Escalated | SessionPhase::Closed)
    }

    /// Consummated contacts within the trailing window ending at `now`.
    pub fn contacts_within(&self, window: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - window;
        self.contact_history.iter().filter(|event| event.occurred_at > cutoff).count()
    }

    pub fn record_contact(&mut self, now: DateTime<Utc>) {
        self.contact_history.push(ContactEvent {
            session_id: self.id.clone(),
            channel: self.channel,
            occurred_at: now,
        });
        self.last_contact_at = Some(now);
    }

    pub fn latest_proposed_offer_mut(&mut self) -> Option<&mut Offer> {
        self.offers
            .iter_mut()
            .rev()
            .find(|offer| offer.status == crate::domain::offer::OfferStatus::Proposed)
    }
}
