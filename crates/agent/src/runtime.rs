use chrono::{DateTime, Utc};

use recova_core::{
    AuditSink, ConversationOrchestrator, EngineConfig, ExternalOutcome, LoanSnapshot,
    ReplyOutcome, Session, TurnInput, TurnResult,
};

use crate::conversation::SignalExtractor;
use crate::guardrails::{ReplyGate, ReplyGateDecision};
use crate::llm::{AssistantReply, LlmClient};

/// Everything the caller gathered for one turn: the raw borrower text, the
/// loan snapshot, results of any external calls it ran, and retrieved context
/// passages (passed through to the prompt, never inspected here).
#[derive(Clone, Debug)]
pub struct TurnRequest {
    pub correlation_id: String,
    pub inbound_text: String,
    pub loan: LoanSnapshot,
    pub verification: Option<ExternalOutcome>,
    pub payment: Option<ExternalOutcome>,
    pub context_passages: Vec<String>,
}

/// Per-turn glue between transports, the language model, and the engine.
///
/// A model reply whose plan sketch violates negotiation policy is treated as
/// untrusted: the sketch is dropped and its self-reported confidence zeroed,
/// which routes the turn toward escalation instead of sending ungoverned
/// terms. A failed model call surfaces as `ReplyOutcome::Failed`; retry
/// policy belongs to the caller, never to this runtime.
pub struct AgentRuntime {
    extractor: SignalExtractor,
    gate: ReplyGate,
    orchestrator: ConversationOrchestrator,
}

impl AgentRuntime {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            extractor: SignalExtractor::new(),
            gate: ReplyGate::new(config.negotiation.clone()),
            orchestrator: ConversationOrchestrator::new(config),
        }
    }

    pub async fn handle_turn(
        &self,
        session: Session,
        request: &TurnRequest,
        now: DateTime<Utc>,
        llm: &dyn LlmClient,
        sink: &dyn AuditSink,
    ) -> TurnResult {
        let extracted = self.extractor.extract(&request.inbound_text);
        let prompt = build_prompt(&session, &request.inbound_text, &request.context_passages);

        let reply = match llm.complete(&prompt).await {
            Ok(raw) => {
                let mut reply = AssistantReply::parse(&raw);
                if let ReplyGateDecision::StripPlan { .. } =
                    self.gate.evaluate(&reply, request.loan.balance)
                {
                    reply.structured_plan = None;
                    reply.confidence = 0.0;
                }
                ReplyOutcome::Reply(reply.into_draft())
            }
            Err(_) => ReplyOutcome::Failed,
        };

        let turn = TurnInput {
            correlation_id: request.correlation_id.clone(),
            loan: request.loan.clone(),
            borrower: extracted.signals,
            verification: request.verification,
            payment: request.payment,
            reply,
        };

        self.orchestrator.handle_turn(session, &turn, now, sink)
    }
}

fn build_prompt(session: &Session, inbound_text: &str, context_passages: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a debt recovery assistant. Be professional, empathetic, and concise. \
         Never use threatening language. Respond with a JSON object matching the reply \
         contract (action, message_to_user, structured_plan, confidence, escalation, \
         compliance_checks).\n",
    );
    prompt.push_str(&format!(
        "Conversation phase: {:?}. Channel: {:?}. Identity verified: {:?}.\n",
        session.phase, session.channel, session.verification
    ));

    if !context_passages.is_empty() {
        prompt.push_str("Context:\n");
        for passage in context_passages {
            prompt.push_str("- ");
            prompt.push_str(passage);
            prompt.push('\n');
        }
    }

    prompt.push_str("Borrower: ");
    prompt.push_str(inbound_text);
    prompt
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    use recova_core::{
        ActionKind, BorrowerRef, Channel, EscalationTrigger, InMemoryAuditSink, LoanRef,
        LoanSnapshot, OutboundAction, Session, SessionId, SessionPhase,
    };

    use super::{AgentRuntime, TurnRequest};
    use crate::llm::LlmClient;

    struct ScriptedLlm {
        response: Option<String>,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.response.clone().ok_or_else(|| anyhow!("model unavailable"))
        }
    }

    fn midday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 6, 15, 0, 0).unwrap()
    }

    fn runtime() -> AgentRuntime {
        AgentRuntime::new(recova_core::EngineConfig::default())
    }

    fn session() -> Session {
        Session::new(
            SessionId("S-RT".to_string()),
            LoanRef("L-RT".to_string()),
            BorrowerRef("B-RT".to_string()),
            Channel::Chat,
            Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap(),
        )
    }

    fn request(inbound_text: &str) -> TurnRequest {
        TurnRequest {
            correlation_id: "req-rt-1".to_string(),
            inbound_text: inbound_text.to_string(),
            loan: LoanSnapshot { balance: Decimal::from(1000) },
            verification: None,
            payment: None,
            context_passages: vec!["Account is 90 days past due.".to_string()],
        }
    }

    #[tokio::test]
    async fn greeting_turn_flows_through_to_a_response() {
        let runtime = runtime();
        let sink = InMemoryAuditSink::default();
        let llm = ScriptedLlm {
            response: Some(
                r#"{"action": "verify_identity", "message_to_user": "First, let me verify your identity.", "confidence": 0.95}"#
                    .to_string(),
            ),
        };

        let result = runtime
            .handle_turn(session(), &request("I got your message about my loan"), midday(), &llm, &sink)
            .await;

        assert_eq!(result.session.phase, SessionPhase::Verification);
        assert!(matches!(
            result.outbound,
            OutboundAction::Respond { kind: ActionKind::RequestVerification, .. }
        ));
    }

    #[tokio::test]
    async fn unavailable_model_escalates_fail_safe() {
        let runtime = runtime();
        let sink = InMemoryAuditSink::default();
        let llm = ScriptedLlm { response: None };

        let result = runtime
            .handle_turn(session(), &request("hello, what is this about?"), midday(), &llm, &sink)
            .await;

        assert_eq!(result.session.phase, SessionPhase::Escalated);
        assert_eq!(
            result.outbound,
            OutboundAction::Handoff { trigger: EscalationTrigger::ExternalDependencyFailure }
        );
    }

    #[tokio::test]
    async fn unparseable_model_output_routes_to_low_confidence_escalation() {
        let runtime = runtime();
        let sink = InMemoryAuditSink::default();
        let llm = ScriptedLlm { response: Some("sorry, I got confused".to_string()) };

        let result = runtime
            .handle_turn(session(), &request("can you help me?"), midday(), &llm, &sink)
            .await;

        assert_eq!(result.escalation, Some(EscalationTrigger::LowConfidence));
        assert_eq!(result.session.phase, SessionPhase::Escalated);
    }

    #[tokio::test]
    async fn off_policy_plan_sketch_is_not_trusted() {
        let runtime = runtime();
        let sink = InMemoryAuditSink::default();
        // 95% settlement is far above the configured ceiling.
        let llm = ScriptedLlm {
            response: Some(
                r#"{"action": "propose_plan", "message_to_user": "I can settle this for $950 today.", "structured_plan": {"type": "settlement", "amount": 950}, "confidence": 0.97}"#
                    .to_string(),
            ),
        };

        let mut session = session();
        session.phase = SessionPhase::Negotiation;
        session.verification = recova_core::VerificationStatus::Verified;

        let result = runtime
            .handle_turn(session, &request("what settlement can you do?"), midday(), &llm, &sink)
            .await;

        assert_eq!(result.escalation, Some(EscalationTrigger::LowConfidence));
        assert!(result.session.offers.is_empty());
    }

    #[tokio::test]
    async fn borrower_opt_out_is_acknowledged() {
        let runtime = runtime();
        let sink = InMemoryAuditSink::default();
        let llm = ScriptedLlm {
            response: Some(
                r#"{"action": "acknowledge", "message_to_user": "You will not be contacted again.", "confidence": 0.99}"#
                    .to_string(),
            ),
        };

        let result = runtime
            .handle_turn(session(), &request("stop contacting me"), midday(), &llm, &sink)
            .await;

        assert!(result.session.opted_out);
        assert!(matches!(
            result.outbound,
            OutboundAction::Respond { kind: ActionKind::AcknowledgeOptOut, .. }
        ));
    }
}
