use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    /// One-time reduced payment resolving the debt in full.
    Settlement { pct: Decimal, amount: Decimal },
    /// Multi-period repayment; `monthly * term_months` retires at least the
    /// full balance.
    Installment { monthly: Decimal, term_months: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Proposed,
    Accepted,
    Rejected,
    Expired,
}

/// A proposed resolution. Offers are append-only on the session; status moves
/// through proposed -> accepted/rejected/expired but records are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub kind: OfferKind,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn settlement(pct: Decimal, amount: Decimal, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OfferId(Uuid::new_v4().to_string()),
            kind: OfferKind::Settlement { pct, amount },
            status: OfferStatus::Proposed,
            created_at,
        }
    }

    pub fn installment(monthly: Decimal, term_months: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OfferId(Uuid::new_v4().to_string()),
            kind: OfferKind::Installment { monthly, term_months },
            status: OfferStatus::Proposed,
            created_at,
        }
    }

    /// Total amount the lender recovers if the borrower completes this offer.
    pub fn recoverable_amount(&self) -> Decimal {
        match &self.kind {
            OfferKind::Settlement { amount, .. } => *amount,
            OfferKind::Installment { monthly, term_months } => {
                *monthly * Decimal::from(*term_months)
            }
        }
    }

    pub fn is_settlement(&self) -> bool {
        matches!(self.kind, OfferKind::Settlement { .. })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Offer, OfferKind, OfferStatus};

    #[test]
    fn recoverable_amount_covers_both_kinds() {
        let settlement =
            Offer::settlement(Decimal::new(70, 2), Decimal::new(70_000, 2), Utc::now());
        assert_eq!(settlement.recoverable_amount(), Decimal::new(70_000, 2));

        let installment = Offer::installment(Decimal::from(84), 12, Utc::now());
        assert_eq!(installment.recoverable_amount(), Decimal::from(1008));
    }

    #[test]
    fn new_offers_start_proposed() {
        let offer = Offer::installment(Decimal::from(100), 6, Utc::now());
        assert_eq!(offer.status, OfferStatus::Proposed);
        assert!(matches!(offer.kind, OfferKind::Installment { term_months: 6, .. }));
    }
}
