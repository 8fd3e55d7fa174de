//! Audit sinks

use crate::common::traits::{AuditAction, AuditEvent, AuditSink};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Writes each audit event as a structured tracing event on target `audit`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            action = event.action.as_str(),
            round_id = event.round_id.as_deref().unwrap_or("-"),
            wager_id = event.wager_id.as_deref().unwrap_or("-"),
            player_id = event.player_id.as_deref().unwrap_or("-"),
            operator_id = event.operator_id.as_deref().unwrap_or("-"),
            timestamp = %event.timestamp,
            details = %event.details,
        );
    }
}

/// Keeps events in memory; used by tests to assert on the audit trail
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }

    pub async fn count(&self, action: AuditAction) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.action == action)
            .count()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.events.lock().await.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_counts_by_action() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::new(AuditAction::BetPlaced)).await;
        sink.record(AuditEvent::new(AuditAction::BetPlaced)).await;
        sink.record(AuditEvent::new(AuditAction::WalletDebit).round("r-1")).await;

        assert_eq!(sink.count(AuditAction::BetPlaced).await, 2);
        assert_eq!(sink.count(AuditAction::BetSettled).await, 0);
        assert_eq!(sink.events().await[2].round_id.as_deref(), Some("r-1"));
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        TracingAuditSink
            .record(AuditEvent::new(AuditAction::RoundStateChange).round("r-1"))
            .await;
    }
}
