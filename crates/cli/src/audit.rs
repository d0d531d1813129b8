use recova_core::{AuditEvent, AuditSink};

/// Forwards engine audit events to the tracing subscriber as structured
/// fields. Events carry identifiers and rule codes only, so they are safe to
/// log as-is; free-text redaction stays with whatever sink ships to storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        tracing::info!(
            event_name = %event.event_type,
            correlation_id = %event.correlation_id,
            session_id = event.session_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown"),
            loan_ref = event.loan_ref.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown"),
            outcome = ?event.outcome,
            category = ?event.category,
            metadata = ?event.metadata,
            "audit event"
        );
    }
}
