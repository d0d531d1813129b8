use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recova_core::{ActionKind, OutboundDraft};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantAction {
    Inform,
    CollectPayment,
    ProposePlan,
    Acknowledge,
    RequestInfo,
    VerifyIdentity,
    Escalate,
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Installment,
    Settlement,
    OneTime,
}

/// Plan terms the model suggested. Advisory only - the engine always derives
/// its own offers; the gate in `guardrails` strips sketches that fall outside
/// policy so they never influence a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanSketch {
    #[serde(rename = "type")]
    pub kind: PlanKind,
    pub amount: Decimal,
    #[serde(default)]
    pub installments: Option<u32>,
    #[serde(default)]
    pub first_due_date: Option<String>,
}

/// The structured reply contract the model must honor: a JSON object with
/// the action, user-facing message, optional plan sketch, confidence score,
/// and an explicit escalation flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub action: AssistantAction,
    pub message_to_user: String,
    #[serde(default)]
    pub structured_plan: Option<PlanSketch>,
    pub confidence: f32,
    #[serde(default)]
    pub escalation: bool,
    #[serde(default)]
    pub compliance_checks: Vec<String>,
}

impl AssistantReply {
    /// Parse a reply out of raw model output. Models wrap the JSON object in
    /// prose often enough that we scan for the first balanced object instead
    /// of parsing the whole string. Anything unparseable degrades to the
    /// safe default: zero confidence, routed toward escalation.
    pub fn parse(raw: &str) -> Self {
        extract_json_block(raw)
            .and_then(|block| serde_json::from_str::<Self>(block).ok())
            .map(Self::clamped)
            .unwrap_or_else(Self::safe_default)
    }

    pub fn safe_default() -> Self {
        Self {
            action: AssistantAction::Escalate,
            message_to_user: String::new(),
            structured_plan: None,
            confidence: 0.0,
            escalation: false,
            compliance_checks: Vec::new(),
        }
    }

    fn clamped(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }

    pub fn action_kind(&self) -> ActionKind {
        match self.action {
            AssistantAction::Inform | AssistantAction::Acknowledge | AssistantAction::Escalate => {
                ActionKind::Inform
            }
            AssistantAction::CollectPayment => ActionKind::CollectPayment,
            AssistantAction::ProposePlan => ActionKind::ProposeOffers,
            AssistantAction::RequestInfo => ActionKind::RequestInfo,
            AssistantAction::VerifyIdentity => ActionKind::RequestVerification,
            AssistantAction::Close => ActionKind::Close,
        }
    }

    pub fn into_draft(self) -> OutboundDraft {
        OutboundDraft {
            kind: self.action_kind(),
            confidence: Some(self.confidence),
            escalation_requested: self.escalation,
            text: self.message_to_user,
        }
    }
}

/// First balanced `{...}` block in the input, tracking string literals so
/// braces inside message text do not unbalance the scan.
fn extract_json_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
