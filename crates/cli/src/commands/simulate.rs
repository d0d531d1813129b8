use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recova_agent::llm::LlmClient;
use recova_agent::runtime::{AgentRuntime, TurnRequest};
use recova_core::config::{EngineConfig, LoadOptions};
use recova_core::{
    BorrowerRef, Channel, ExternalOutcome, LoanRef, LoanSnapshot, Session, SessionId,
};

use crate::audit::TracingAuditSink;
use crate::commands::CommandResult;

/// A scripted conversation: starting loan state plus one entry per borrower
/// turn. Model replies are scripted verbatim, so a run is fully
/// deterministic and needs no network.
#[derive(Debug, Deserialize)]
struct Script {
    balance: Decimal,
    #[serde(default)]
    channel: Option<Channel>,
    turns: Vec<ScriptTurn>,
}

#[derive(Debug, Deserialize)]
struct ScriptTurn {
    borrower: String,
    /// Raw model output for this turn; omit to simulate a model failure.
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    verification: Option<ExternalOutcome>,
    #[serde(default)]
    payment: Option<ExternalOutcome>,
    #[serde(default)]
    at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct TurnSummary {
    turn: usize,
    phase: String,
    outbound: String,
    escalation: Option<String>,
    contacts_recorded: usize,
    offers_on_session: usize,
}

struct ScriptedLlm {
    replies: Mutex<VecDeque<Option<String>>>,
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        let next = match self.replies.lock() {
            Ok(mut replies) => replies.pop_front().flatten(),
            Err(poisoned) => poisoned.into_inner().pop_front().flatten(),
        };
        next.ok_or_else(|| anyhow!("scripted model reply unavailable"))
    }
}

pub fn run(file: &Path) -> CommandResult {
    let raw = match fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
                "script_read",
                format!("could not read `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let script: Script = match serde_json::from_str(&raw) {
        Ok(script) => script,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
                "script_parse",
                format!("could not parse `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let config = match EngineConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("simulate", "config_validation", error.to_string(), 2);
        }
    };

    let runtime_result = tokio::runtime::Builder::new_current_thread().enable_all().build();
    let tokio_runtime = match runtime_result {
        Ok(tokio_runtime) => tokio_runtime,
        Err(error) => {
            return CommandResult::failure("simulate", "runtime", error.to_string(), 3);
        }
    };

    let summaries = tokio_runtime.block_on(run_script(config, script));
    match serde_json::to_string_pretty(&summaries) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("simulate", "serialization", error.to_string(), 3),
    }
}

async fn run_script(config: EngineConfig, script: Script) -> Vec<TurnSummary> {
    let runtime = AgentRuntime::new(config);
    let sink = TracingAuditSink;
    let llm = ScriptedLlm {
        replies: Mutex::new(script.turns.iter().map(|turn| turn.reply.clone()).collect()),
    };

    let started_at = Utc::now();
    let mut session = Session::new(
        SessionId("S-SIM".to_string()),
        LoanRef("L-SIM".to_string()),
        BorrowerRef("B-SIM".to_string()),
        script.channel.unwrap_or(Channel::Chat),
        started_at,
    );

    let mut summaries = Vec::with_capacity(script.turns.len());
    for (index, turn) in script.turns.iter().enumerate() {
        let request = TurnRequest {
            correlation_id: format!("sim-{}", index + 1),
            inbound_text: turn.borrower.clone(),
            loan: LoanSnapshot { balance: script.balance },
            verification: turn.verification,
            payment: turn.payment,
            context_passages: Vec::new(),
        };
        let now = turn.at.unwrap_or(started_at);

        let result = runtime.handle_turn(session, &request, now, &llm, &sink).await;
        session = result.session;

        summaries.push(TurnSummary {
            turn: index + 1,
            phase: format!("{:?}", session.phase),
            outbound: outbound_label(&result.outbound),
            escalation: result.escalation.map(|trigger| trigger.as_str().to_string()),
            contacts_recorded: session.contact_history.len(),
            offers_on_session: session.offers.len(),
        });
    }

    summaries
}

fn outbound_label(outbound: &recova_core::OutboundAction) -> String {
    use recova_core::OutboundAction;

    match outbound {
        OutboundAction::Respond { kind, .. } => format!("respond:{kind:?}").to_lowercase(),
        OutboundAction::ProposeOffers { offers, .. } => format!("propose_offers:{}", offers.len()),
        OutboundAction::Refusal { rule } => format!("refusal:{}", rule.as_str()),
        OutboundAction::Handoff { trigger } => format!("handoff:{}", trigger.as_str()),
        OutboundAction::NoAction => "no_action".to_string(),
    }
}
