use std::time::Instant;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use recova_core::config::{EngineConfig, LoadOptions};
use recova_core::{
    ActionKind, BorrowerRef, BorrowerSignals, Channel, ConversationOrchestrator,
    EscalationTrigger, InMemoryAuditSink, LoanRef, LoanSnapshot, OutboundAction, OutboundDraft,
    ReplyOutcome, RuleCode, Session, SessionId, SessionPhase, TurnInput, VerificationStatus,
};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

/// Deterministic end-to-end pass over the engine: config load, a greeting
/// turn, a negotiation turn with offers, an after-hours block, and the
/// fail-safe escalation on a missing model reply. No I/O beyond stdout.
pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed(|| EngineConfig::load(LoadOptions::default())) {
        (elapsed_ms, Ok(config)) => {
            checks.push(pass("config_load", elapsed_ms, "configuration loaded and validated"));
            config
        }
        (elapsed_ms, Err(error)) => {
            checks.push(fail("config_load", elapsed_ms, format!("config load failed: {error}")));
            return finalize(started, checks);
        }
    };

    let orchestrator = ConversationOrchestrator::new(config);
    let sink = InMemoryAuditSink::default();
    let midday = fixed_time(2026, 7, 6, 15);

    let (elapsed_ms, greeting_ok) = timed(|| {
        let result = orchestrator.handle_turn(
            session(SessionPhase::Greeting),
            &turn(draft(ActionKind::RequestVerification, "Let me verify your identity first.")),
            midday,
            &sink,
        );
        result.session.phase == SessionPhase::Verification && result.outbound.is_contact()
    });
    checks.push(check("greeting_turn", greeting_ok, elapsed_ms, "greeting advances to verification"));

    let (elapsed_ms, offers_ok) = timed(|| {
        let mut input = turn(draft(ActionKind::ProposeOffers, "Here is what we can do."));
        input.borrower.stated_capacity = Some(Decimal::from(200));
        input.loan.balance = Decimal::from(1200);
        let result =
            orchestrator.handle_turn(session(SessionPhase::Negotiation), &input, midday, &sink);
        matches!(result.outbound, OutboundAction::ProposeOffers { ref offers, .. } if offers.len() >= 2)
    });
    checks.push(check("negotiation_offers", offers_ok, elapsed_ms, "negotiation produces an offer menu"));

    let (elapsed_ms, block_ok) = timed(|| {
        let ten_pm = fixed_time(2026, 7, 6, 22);
        let result = orchestrator.handle_turn(
            session(SessionPhase::Greeting),
            &turn(draft(ActionKind::Inform, "Evening update.")),
            ten_pm,
            &sink,
        );
        result.outbound == OutboundAction::Refusal { rule: RuleCode::OutsideContactHours }
            && result.session.contact_history.is_empty()
    });
    checks.push(check("after_hours_block", block_ok, elapsed_ms, "after-hours contact is refused"));

    let (elapsed_ms, fail_safe_ok) = timed(|| {
        let mut input = turn(draft(ActionKind::Inform, ""));
        input.reply = ReplyOutcome::Failed;
        let result =
            orchestrator.handle_turn(session(SessionPhase::Negotiation), &input, midday, &sink);
        result.outbound
            == OutboundAction::Handoff { trigger: EscalationTrigger::ExternalDependencyFailure }
    });
    checks.push(check("fail_safe_escalation", fail_safe_ok, elapsed_ms, "missing reply escalates"));

    finalize(started, checks)
}

fn session(phase: SessionPhase) -> Session {
    let mut session = Session::new(
        SessionId("S-SMOKE".to_string()),
        LoanRef("L-SMOKE".to_string()),
        BorrowerRef("B-SMOKE".to_string()),
        Channel::Chat,
        fixed_time(2026, 7, 1, 12),
    );
    if phase == SessionPhase::Negotiation {
        session.verification = VerificationStatus::Verified;
    }
    session.phase = phase;
    session
}

fn draft(kind: ActionKind, text: &str) -> OutboundDraft {
    OutboundDraft {
        kind,
        text: text.to_string(),
        confidence: Some(0.9),
        escalation_requested: false,
    }
}

fn turn(draft: OutboundDraft) -> TurnInput {
    TurnInput {
        correlation_id: "smoke".to_string(),
        loan: LoanSnapshot { balance: Decimal::from(1000) },
        borrower: BorrowerSignals { substantive: true, ..BorrowerSignals::default() },
        verification: None,
        payment: None,
        reply: ReplyOutcome::Reply(draft),
    }
}

fn fixed_time(year: i32, month: u32, day: u32, hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single().unwrap_or_default()
}

fn timed<T>(run: impl FnOnce() -> T) -> (u64, T) {
    let started = Instant::now();
    let value = run();
    (started.elapsed().as_millis() as u64, value)
}

fn pass(name: &'static str, elapsed_ms: u64, message: &str) -> SmokeCheck {
    SmokeCheck { name, status: SmokeStatus::Pass, elapsed_ms, message: message.to_string() }
}

fn fail(name: &'static str, elapsed_ms: u64, message: String) -> SmokeCheck {
    SmokeCheck { name, status: SmokeStatus::Fail, elapsed_ms, message }
}

fn check(name: &'static str, ok: bool, elapsed_ms: u64, message: &str) -> SmokeCheck {
    if ok {
        pass(name, elapsed_ms, message)
    } else {
        fail(name, elapsed_ms, format!("{message}: expectation not met"))
    }
}

fn finalize(started: Instant, checks: Vec<SmokeCheck>) -> CommandResult {
    let failed = checks.iter().filter(|check| check.status == SmokeStatus::Fail).count();
    let status = if failed == 0 { SmokeStatus::Pass } else { SmokeStatus::Fail };
    let report = SmokeReport {
        command: "smoke",
        status,
        summary: if failed == 0 {
            format!("{} checks passed", checks.len())
        } else {
            format!("{failed} of {} checks failed", checks.len())
        },
        total_elapsed_ms: started.elapsed().as_millis() as u64,
        checks,
    };

    match serde_json::to_string(&report) {
        Ok(output) => CommandResult {
            exit_code: if failed == 0 { 0 } else { 1 },
            output,
        },
        Err(error) => CommandResult::failure("smoke", "serialization", error.to_string(), 3),
    }
}
