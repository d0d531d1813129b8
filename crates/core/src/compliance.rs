use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ComplianceConfig;
use crate::domain::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCode {
    OutsideContactHours,
    FrequencyExceeded,
    OptedOut,
    ValidationPending,
    ProhibitedContent,
}

impl RuleCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutsideContactHours => "outside_contact_hours",
            Self::FrequencyExceeded => "frequency_exceeded",
            Self::OptedOut => "opted_out",
            Self::ValidationPending => "validation_pending",
            Self::ProhibitedContent => "prohibited_content",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredAction {
    None,
    MaskContent { masked_text: String },
    Block,
    Escalate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceDecision {
    pub allowed: bool,
    pub violations: Vec<RuleCode>,
    pub required_action: RequiredAction,
}

impl ComplianceDecision {
    fn allow() -> Self {
        Self { allowed: true, violations: Vec::new(), required_action: RequiredAction::None }
    }

    fn blocked(rule: RuleCode, required_action: RequiredAction) -> Self {
        Self { allowed: false, violations: vec![rule], required_action }
    }

    pub fn first_violation(&self) -> Option<RuleCode> {
        self.violations.first().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Inform,
    RequestInfo,
    RequestVerification,
    ProposeOffers,
    CollectPayment,
    AcknowledgeOptOut,
    AcknowledgeValidation,
    Close,
}

impl ActionKind {
    /// Actions frozen while a debt-validation request is unresolved.
    pub fn is_negotiation(&self) -> bool {
        matches!(self, Self::ProposeOffers | Self::CollectPayment)
    }
}

/// The outbound action the caller intends to take, including the literal
/// text it would send. The guard inspects the text for prohibited phrases;
/// everything else is gated on metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub kind: ActionKind,
    pub text: String,
}

/// Pure rule evaluator. Checks run in a fixed order and short-circuit on the
/// first hard violation; evaluation never mutates anything, so identical
/// inputs always produce identical decisions.
#[derive(Clone, Debug)]
pub struct ComplianceGuard {
    config: ComplianceConfig,
}

impl ComplianceGuard {
    pub fn new(config: ComplianceConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(
        &self,
        session: &Session,
        proposed: &ProposedAction,
        now: DateTime<Utc>,
    ) -> ComplianceDecision {
        if let Some(decision) = self.check_contact_window(session, now) {
            return decision;
        }
        if let Some(decision) = self.check_frequency(session, now) {
            return decision;
        }
        if let Some(decision) = check_opt_out(session, proposed) {
            return decision;
        }
        if let Some(decision) = check_validation_pending(session, proposed) {
            return decision;
        }
        if let Some(decision) = self.check_prohibited_content(proposed) {
            return decision;
        }

        ComplianceDecision::allow()
    }

    fn check_contact_window(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Option<ComplianceDecision> {
        let local = now + Duration::minutes(i64::from(session.local_offset_minutes));
        let time_of_day = local.time();

        let inside = time_of_day >= self.config.contact_hours_start
            && time_of_day < self.config.contact_hours_end;
        if inside {
            return None;
        }

        Some(ComplianceDecision::blocked(RuleCode::OutsideContactHours, RequiredAction::Block))
    }

    fn check_frequency(&self, session: &Session, now: DateTime<Utc>) -> Option<ComplianceDecision> {
        let daily = session.contacts_within(Duration::hours(24), now);
        let weekly = session.contacts_within(Duration::days(7), now);

        let daily_exceeded = daily >= self.config.max_daily_contacts as usize;
        let weekly_exceeded = weekly >= self.config.max_weekly_contacts as usize;
        if !daily_exceeded && !weekly_exceeded {
            return None;
        }

        Some(ComplianceDecision::blocked(RuleCode::FrequencyExceeded, RequiredAction::Block))
    }

    fn check_prohibited_content(&self, proposed: &ProposedAction) -> Option<ComplianceDecision> {
        let lowered = proposed.text.to_lowercase();
        let matched: Vec<_> = self
            .config
            .prohibited_phrases
            .iter()
            .filter(|phrase| lowered.contains(&phrase.pattern.to_lowercase()))
            .collect();

        if matched.is_empty() {
            return None;
        }

        if matched.iter().any(|phrase| phrase.replacement.is_none()) {
            return Some(ComplianceDecision::blocked(
                RuleCode::ProhibitedContent,
                RequiredAction::Block,
            ));
        }

        let mut masked = proposed.text.clone();
        for phrase in &matched {
            if let Some(replacement) = &phrase.replacement {
                masked = mask_phrase(&masked, &phrase.pattern, replacement);
            }
        }

        Some(ComplianceDecision {
            allowed: true,
            violations: vec![RuleCode::ProhibitedContent],
            required_action: RequiredAction::MaskContent { masked_text: masked },
        })
    }
}

fn check_opt_out(session: &Session, proposed: &ProposedAction) -> Option<ComplianceDecision> {
    if !session.opted_out || proposed.kind == ActionKind::AcknowledgeOptOut {
        return None;
    }

    Some(ComplianceDecision::blocked(RuleCode::OptedOut, RequiredAction::Block))
}

fn check_validation_pending(
    session: &Session,
    proposed: &ProposedAction,
) -> Option<ComplianceDecision> {
    if !session.validation_pending || !proposed.kind.is_negotiation() {
        return None;
    }

    Some(ComplianceDecision::blocked(RuleCode::ValidationPending, RequiredAction::Escalate))
}

/// Case-insensitive substring replacement. Patterns are ASCII phrases, so
/// byte offsets found in the lowered text are valid in the original.
fn mask_phrase(text: &str, pattern: &str, replacement: &str) -> String {
    let needle = pattern.to_lowercase();
    if needle.is_empty() {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.to_lowercase().find(&needle) {
            Some(index) => {
                output.push_str(&rest[..index]);
                output.push_str(replacement);
                rest = &rest[index + needle.len()..];
            }
            None => {
                output.push_str(rest);
                return output;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{ActionKind, ComplianceGuard, ProposedAction, RequiredAction, RuleCode};
    use crate::config::{ComplianceConfig, ProhibitedPhrase};
    use crate::domain::session::{BorrowerRef, Channel, LoanRef, Session, SessionId};

    fn session() -> Session {
        Session::new(
            SessionId("S-1".to_string()),
            LoanRef("L-1".to_string()),
            BorrowerRef("B-1".to_string()),
            Channel::Chat,
            Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
        )
    }

    fn guard() -> ComplianceGuard {
        ComplianceGuard::new(ComplianceConfig::default())
    }

    fn inform(text: &str) -> ProposedAction {
        ProposedAction { kind: ActionKind::Inform, text: text.to_string() }
    }

    #[test]
    fn after_hours_contact_is_blocked_regardless_of_content() {
        let guard = guard();
        let session = session();
        let ten_pm = Utc.with_ymd_and_hms(2026, 4, 1, 22, 0, 0).unwrap();

        for action in [
            inform("Your account balance is available on request."),
            ProposedAction { kind: ActionKind::AcknowledgeOptOut, text: String::new() },
            ProposedAction { kind: ActionKind::ProposeOffers, text: "plan options".to_string() },
        ] {
            let decision = guard.evaluate(&session, &action, ten_pm);
            assert!(!decision.allowed);
            assert_eq!(decision.first_violation(), Some(RuleCode::OutsideContactHours));
        }
    }

    #[test]
    fn contact_window_end_is_exclusive() {
        let guard = guard();
        let session = session();

        let nine_pm = Utc.with_ymd_and_hms(2026, 4, 1, 21, 0, 0).unwrap();
        let decision = guard.evaluate(&session, &inform("hello"), nine_pm);
        assert_eq!(decision.first_violation(), Some(RuleCode::OutsideContactHours));

        let just_before = Utc.with_ymd_and_hms(2026, 4, 1, 20, 59, 59).unwrap();
        assert!(guard.evaluate(&session, &inform("hello"), just_before).allowed);
    }

    #[test]
    fn contact_window_respects_borrower_local_offset() {
        let guard = guard();
        let mut session = session();
        session.local_offset_minutes = -300;

        // 23:00 UTC is 18:00 borrower-local, inside the window.
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 23, 0, 0).unwrap();
        assert!(guard.evaluate(&session, &inform("hello"), now).allowed);
    }

    #[test]
    fn daily_frequency_limit_blocks_further_contact() {
        let guard = guard();
        let mut session = session();
        let now = Utc.with_ymd_and_hms(2026, 4, 2, 15, 0, 0).unwrap();

        session.record_contact(now - Duration::hours(1));
        session.record_contact(now - Duration::hours(2));
        assert!(guard.evaluate(&session, &inform("checking in"), now).allowed);

        session.record_contact(now - Duration::hours(3));
        let decision = guard.evaluate(&session, &inform("checking in"), now);
        assert!(!decision.allowed);
        assert_eq!(decision.first_violation(), Some(RuleCode::FrequencyExceeded));
    }

    #[test]
    fn weekly_frequency_limit_counts_trailing_seven_days() {
        let guard = guard();
        let mut session = session();
        let now = Utc.with_ymd_and_hms(2026, 4, 10, 15, 0, 0).unwrap();

        for day in 1..=6 {
            session.record_contact(now - Duration::days(day));
        }
        session.record_contact(now - Duration::hours(12));

        let decision = guard.evaluate(&session, &inform("checking in"), now);
        assert_eq!(decision.first_violation(), Some(RuleCode::FrequencyExceeded));
    }

    #[test]
    fn opted_out_session_only_allows_the_acknowledgement() {
        let guard = guard();
        let mut session = session();
        session.opted_out = true;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 15, 0, 0).unwrap();

        let blocked = guard.evaluate(&session, &inform("about your balance"), now);
        assert!(!blocked.allowed);
        assert_eq!(blocked.first_violation(), Some(RuleCode::OptedOut));

        let ack = ProposedAction {
            kind: ActionKind::AcknowledgeOptOut,
            text: "You have been removed from our contact list.".to_string(),
        };
        assert!(guard.evaluate(&session, &ack, now).allowed);
    }

    #[test]
    fn pending_validation_freezes_negotiation_but_not_information() {
        let guard = guard();
        let mut session = session();
        session.validation_pending = true;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 15, 0, 0).unwrap();

        let offers = ProposedAction {
            kind: ActionKind::ProposeOffers,
            text: "Here are your plan options.".to_string(),
        };
        let decision = guard.evaluate(&session, &offers, now);
        assert!(!decision.allowed);
        assert_eq!(decision.first_violation(), Some(RuleCode::ValidationPending));
        assert_eq!(decision.required_action, RequiredAction::Escalate);

        let info = inform("Validation documentation will arrive within 30 days.");
        assert!(guard.evaluate(&session, &info, now).allowed);
    }

    #[test]
    fn prohibited_phrase_without_replacement_blocks() {
        let guard = guard();
        let session = session();
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 15, 0, 0).unwrap();

        let decision =
            guard.evaluate(&session, &inform("We will pursue a LAWSUIT if you ignore this."), now);
        assert!(!decision.allowed);
        assert_eq!(decision.first_violation(), Some(RuleCode::ProhibitedContent));
        assert_eq!(decision.required_action, RequiredAction::Block);
    }

    #[test]
    fn substitutable_phrase_is_masked_and_allowed() {
        let config = ComplianceConfig {
            prohibited_phrases: vec![ProhibitedPhrase {
                pattern: "legal action".to_string(),
                replacement: Some("next steps".to_string()),
            }],
            ..ComplianceConfig::default()
        };
        let guard = ComplianceGuard::new(config);
        let session = session();
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 15, 0, 0).unwrap();

        let decision =
            guard.evaluate(&session, &inform("We may consider Legal Action on this account."), now);
        assert!(decision.allowed);
        assert_eq!(
            decision.required_action,
            RequiredAction::MaskContent {
                masked_text: "We may consider next steps on this account.".to_string()
            }
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let guard = guard();
        let mut session = session();
        session.record_contact(Utc.with_ymd_and_hms(2026, 4, 1, 13, 0, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 22, 30, 0).unwrap();
        let action = inform("following up on your account");

        let first = guard.evaluate(&session, &action, now);
        let second = guard.evaluate(&session, &action, now);
        assert_eq!(first, second);
    }
}
