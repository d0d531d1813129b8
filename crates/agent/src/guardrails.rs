use rust_decimal::Decimal;

use recova_core::NegotiationConfig;

use crate::llm::{AssistantReply, PlanKind, PlanSketch};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyGateDecision {
    Allow,
    /// The sketch is stripped and the turn continues on the deterministic
    /// offer menu alone.
    StripPlan { reason_code: &'static str, fallback_path: &'static str },
}

/// Gate over model-proposed plan terms. The model may narrate, but it may
/// not commit the lender to numbers: any sketch outside configured policy is
/// removed before the engine sees the reply.
#[derive(Clone, Debug)]
pub struct ReplyGate {
    config: NegotiationConfig,
}

impl ReplyGate {
    pub fn new(config: NegotiationConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, reply: &AssistantReply, balance: Decimal) -> ReplyGateDecision {
        let Some(plan) = &reply.structured_plan else {
            return ReplyGateDecision::Allow;
        };

        match plan.kind {
            PlanKind::Settlement => self.evaluate_settlement(plan, balance),
            PlanKind::Installment => self.evaluate_installment(plan, balance),
            PlanKind::OneTime => {
                if plan.amount >= balance {
                    ReplyGateDecision::Allow
                } else {
                    // A partial "one-time" payment is a settlement in
                    // disguise; hold it to the same bounds.
                    self.evaluate_settlement(plan, balance)
                }
            }
        }
    }

    fn evaluate_settlement(&self, plan: &PlanSketch, balance: Decimal) -> ReplyGateDecision {
        if balance <= Decimal::ZERO {
            return ReplyGateDecision::StripPlan {
                reason_code: "settlement_without_balance",
                fallback_path: "policy_offer_menu",
            };
        }

        let pct = plan.amount / balance;
        if pct > self.config.max_settlement_pct || pct < self.config.min_settlement_pct {
            return ReplyGateDecision::StripPlan {
                reason_code: "settlement_outside_policy",
                fallback_path: "policy_offer_menu",
            };
        }

        ReplyGateDecision::Allow
    }

    fn evaluate_installment(&self, plan: &PlanSketch, balance: Decimal) -> ReplyGateDecision {
        let Some(installments) = plan.installments.filter(|count| *count > 0) else {
            return ReplyGateDecision::StripPlan {
                reason_code: "installment_missing_term",
                fallback_path: "policy_offer_menu",
            };
        };

        let within_policy = installments <= self.config.max_installment_months
            && plan.amount >= self.config.min_payment
            && plan.amount * Decimal::from(installments) >= balance;

        if within_policy {
            ReplyGateDecision::Allow
        } else {
            ReplyGateDecision::StripPlan {
                reason_code: "installment_outside_policy",
                fallback_path: "policy_offer_menu",
            }
        }
    }
}
