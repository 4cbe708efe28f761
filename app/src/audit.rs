use async_trait::async_trait;
use serde_json::Value;

/// Receives notable pipeline events (migration executed, updates triggered,
/// policy escalated/restored). Sink failures are logged at the call site and
/// never fail the operation that produced the event.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &str, detail: Value) -> anyhow::Result<()>;
}

/// Default sink: structured log lines through the tracing pipeline.
#[derive(Default)]
pub struct TracingAudit;

#[async_trait]
impl AuditSink for TracingAudit {
    async fn record(&self, event: &str, detail: Value) -> anyhow::Result<()> {
        tracing::info!(event, %detail, "audit");
        Ok(())
    }
}
