use serde::{Deserialize, Serialize};

use crate::config::EscalationConfig;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTrigger {
    ExternalDependencyFailure,
    BorrowerDistress,
    HumanRequested,
    ComplianceBlock,
    VerificationFailures,
    OffersExhausted,
    LowConfidence,
}

impl EscalationTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalDependencyFailure => "external_dependency_failure",
            Self::BorrowerDistress => "borrower_distress",
            Self::HumanRequested => "human_requested",
            Self::ComplianceBlock => "compliance_block",
            Self::VerificationFailures => "verification_failures",
            Self::OffersExhausted => "offers_exhausted",
            Self::LowConfidence => "low_confidence",
        }
    }
}

/// Everything the orchestrator has learned about a turn that might warrant a
/// hand-off. Confidence is the opaque score reported by the language model;
/// `None` means no scored reply was available this turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EscalationSignals {
    pub external_failure: bool,
    pub distress: bool,
    pub explicit_request: bool,
    pub compliance_block: bool,
    pub verification_failures: u32,
    pub offers_exhausted: bool,
    pub confidence: Option<f32>,
}

#[derive(Clone, Debug)]
pub struct EscalationArbiter {
    config: EscalationConfig,
}

impl EscalationArbiter {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    /// First trigger whose threshold is crossed, in a fixed severity order so
    /// the audit trail names the same trigger for the same inputs every time.
    pub fn decide(&self, signals: &EscalationSignals) -> Option<EscalationTrigger> {
        if signals.external_failure {
            return Some(EscalationTrigger::ExternalDependencyFailure);
        }
        if signals.distress {
            return Some(EscalationTrigger::BorrowerDistress);
        }
        if signals.explicit_request {
            return Some(EscalationTrigger::HumanRequested);
        }
        if signals.compliance_block {
            return Some(EscalationTrigger::ComplianceBlock);
        }
        if signals.verification_failures >= self.config.verification_attempt_limit {
            return Some(EscalationTrigger::VerificationFailures);
        }
        if signals.offers_exhausted {
            return Some(EscalationTrigger::OffersExhausted);
        }
        if let Some(confidence) = signals.confidence {
            if confidence < self.config.confidence_threshold {
                return Some(EscalationTrigger::LowConfidence);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{EscalationArbiter, EscalationSignals, EscalationTrigger};
    use crate::config::EscalationConfig;

    fn arbiter() -> EscalationArbiter {
        EscalationArbiter::new(EscalationConfig::default())
    }

    #[test]
    fn quiet_turn_does_not_escalate() {
        let signals =
            EscalationSignals { confidence: Some(0.91), ..EscalationSignals::default() };
        assert_eq!(arbiter().decide(&signals), None);
    }

    #[test]
    fn low_confidence_crosses_threshold() {
        let signals =
            EscalationSignals { confidence: Some(0.31), ..EscalationSignals::default() };
        assert_eq!(arbiter().decide(&signals), Some(EscalationTrigger::LowConfidence));
    }

    #[test]
    fn verification_failures_use_configured_limit() {
        let arbiter = EscalationArbiter::new(EscalationConfig {
            verification_attempt_limit: 3,
            ..EscalationConfig::default()
        });

        let below = EscalationSignals { verification_failures: 2, ..EscalationSignals::default() };
        assert_eq!(arbiter.decide(&below), None);

        let at_limit =
            EscalationSignals { verification_failures: 3, ..EscalationSignals::default() };
        assert_eq!(arbiter.decide(&at_limit), Some(EscalationTrigger::VerificationFailures));
    }

    #[test]
    fn external_failure_outranks_every_other_signal() {
        let signals = EscalationSignals {
            external_failure: true,
            distress: true,
            explicit_request: true,
            compliance_block: true,
            offers_exhausted: true,
            confidence: Some(0.0),
            verification_failures: 9,
        };

        assert_eq!(
            arbiter().decide(&signals),
            Some(EscalationTrigger::ExternalDependencyFailure)
        );
    }

    #[test]
    fn offers_exhausted_escalates_without_other_signals() {
        let signals = EscalationSignals {
            offers_exhausted: true,
            confidence: Some(0.95),
            ..EscalationSignals::default()
        };
        assert_eq!(arbiter().decide(&signals), Some(EscalationTrigger::OffersExhausted));
    }
}
