use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::NegotiationConfig;
use crate::domain::offer::{Offer, OfferStatus};

/// Pure offer calculator. Deterministic given its inputs; every offer it
/// produces satisfies the configured bounds, so nothing downstream needs to
/// re-check them.
#[derive(Clone, Debug)]
pub struct NegotiationPolicy {
    config: NegotiationConfig,
}

impl NegotiationPolicy {
    pub fn new(config: NegotiationConfig) -> Self {
        Self { config }
    }

    /// Candidate offers ordered best-for-lender first: installment plans
    /// (full recovery) shortest term first, then the settlement candidate.
    ///
    /// Returns an empty vector when no compliant resolution exists: the
    /// balance is not collectable or the stated capacity is below the
    /// minimum permitted payment. The caller treats empty as an escalation
    /// signal, not an error.
    pub fn propose_offers(
        &self,
        balance: Decimal,
        stated_capacity: Option<Decimal>,
        prior_offers: &[Offer],
        now: DateTime<Utc>,
    ) -> Vec<Offer> {
        if balance <= Decimal::ZERO {
            return Vec::new();
        }
        if let Some(capacity) = stated_capacity {
            if capacity < self.config.min_payment {
                return Vec::new();
            }
        }

        let mut offers = Vec::new();

        for term in self.installment_terms(balance, stated_capacity) {
            offers.push(Offer::installment(self.monthly_for(balance, term), term, now));
        }

        let pct = self.settlement_pct(prior_offers);
        let amount = (balance * pct).round_dp(2);
        offers.push(Offer::settlement(pct, amount, now));

        offers
    }

    /// Smallest whole-dollar monthly amount that retires the balance within
    /// `term` months. Rounding up keeps `monthly * term >= balance` without
    /// fractional-cent edge cases.
    fn monthly_for(&self, balance: Decimal, term: u32) -> Decimal {
        (balance / Decimal::from(term)).ceil()
    }

    /// Terms to offer, ascending. The term range is capped so the monthly
    /// amount never drops below the configured minimum payment; when no term
    /// fits the stated capacity, the max-term plan stands as a counter-offer.
    fn installment_terms(&self, balance: Decimal, stated_capacity: Option<Decimal>) -> Vec<u32> {
        let affordable_terms = balance / self.config.min_payment;
        let term_cap = if affordable_terms >= Decimal::from(self.config.max_installment_months) {
            self.config.max_installment_months
        } else {
            // Truncation keeps monthly >= min_payment for every offered term.
            affordable_terms.trunc().to_u32().unwrap_or(0)
        };
        if term_cap == 0 {
            return Vec::new();
        }

        let fits = |term: u32| {
            stated_capacity
                .map(|capacity| self.monthly_for(balance, term) <= capacity)
                .unwrap_or(true)
        };

        let shortest = match (1..=term_cap).find(|term| fits(*term)) {
            Some(term) => term,
            None => return vec![term_cap],
        };

        let mut terms = vec![shortest];
        let midpoint = shortest + (term_cap - shortest) / 2;
        if midpoint > shortest && midpoint < term_cap {
            terms.push(midpoint);
        }
        if term_cap > shortest {
            terms.push(term_cap);
        }
        terms
    }

    /// Settlement percentage starts at the configured ceiling and steps down
    /// once per previously rejected settlement, never past the floor.
    fn settlement_pct(&self, prior_offers: &[Offer]) -> Decimal {
        let rejected_settlements = prior_offers
            .iter()
            .filter(|offer| offer.is_settlement() && offer.status == OfferStatus::Rejected)
            .count();

        let stepped = self.config.max_settlement_pct
            - self.config.settlement_step_pct * Decimal::from(rejected_settlements as u64);
        stepped.max(self.config.min_settlement_pct)
    }
}
