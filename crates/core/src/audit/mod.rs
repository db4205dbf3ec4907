//! Append-only audit event contract.
//!
//! Every mutating core operation emits exactly one audit event as a side
//! effect. Events flow through the [`AuditSink`] trait so the core stays
//! testable without a logging backend. Sink failures are surfaced to the
//! operator log via `tracing::warn!` and never roll back the business
//! mutation that produced the event.

use chrono::{DateTime, Utc};
use meridian_shared::types::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    /// Routine user action.
    Low,
    /// Entity mutation.
    Medium,
    /// Security-relevant action (freeze, block).
    High,
    /// Incident-grade event.
    Critical,
}

/// One append-only record of a mutating action. Serialized for sinks,
/// never read back by the core.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Acting user, if the action was user-initiated.
    pub actor: Option<UserId>,
    /// Action code, e.g. `ACCOUNT_CREATED`.
    pub action: String,
    /// Entity type the action touched.
    pub entity_type: &'static str,
    /// Identifier of the touched entity.
    pub entity_id: String,
    /// Entity snapshot before the mutation.
    pub before: Option<serde_json::Value>,
    /// Entity snapshot after the mutation.
    pub after: Option<serde_json::Value>,
    /// Human-readable description.
    pub description: String,
    /// Originating module, e.g. `LEDGER`.
    pub module: &'static str,
    /// Event severity.
    pub severity: AuditSeverity,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates a low-severity event with the required fields.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        entity_type: &'static str,
        entity_id: impl ToString,
        module: &'static str,
    ) -> Self {
        Self {
            actor: None,
            action: action.into(),
            entity_type,
            entity_id: entity_id.to_string(),
            before: None,
            after: None,
            description: String::new(),
            module,
            severity: AuditSeverity::Low,
            recorded_at: Utc::now(),
        }
    }

    /// Sets the acting user.
    #[must_use]
    pub fn actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Attaches before/after snapshots.
    #[must_use]
    pub fn snapshots(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before = before;
        self.after = after;
        self
    }
}

/// Errors a sink implementation may report.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink could not persist the event.
    #[error("audit sink failure: {0}")]
    Sink(String),
}

/// Append-only destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Records one event.
    ///
    /// # Errors
    ///
    /// Returns `AuditError` if the sink cannot persist the event. Callers
    /// must treat this as fire-and-forget; use [`emit`].
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Records an event, logging (never propagating) sink failures.
pub fn emit(sink: &dyn AuditSink, event: AuditEvent) {
    let action = event.action.clone();
    if let Err(err) = sink.record(event) {
        tracing::warn!(%action, error = %err, "audit sink rejected event");
    }
}

/// Sink that forwards events to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            action = %event.action,
            entity_type = event.entity_type,
            entity_id = %event.entity_id,
            module = event.module,
            severity = ?event.severity,
            description = %event.description,
            "audit"
        );
        Ok(())
    }
}

/// Sink that captures events in memory, for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink poisoned").clone()
    }
}

impl AuditSink for MemorySink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.lock().expect("audit sink poisoned").push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
            Err(AuditError::Sink("disk full".to_string()))
        }
    }

    #[test]
    fn test_memory_sink_captures_events() {
        let sink = MemorySink::new();
        emit(
            &sink,
            AuditEvent::new("ACCOUNT_CREATED", "Account", "acc-1", "LEDGER"),
        );
        emit(
            &sink,
            AuditEvent::new("ACCOUNT_FROZEN", "Account", "acc-1", "LEDGER")
                .severity(AuditSeverity::High),
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, "ACCOUNT_CREATED");
        assert_eq!(events[1].severity, AuditSeverity::High);
    }

    #[test]
    fn test_emit_swallows_sink_failure() {
        // Must not panic or propagate.
        emit(
            &FailingSink,
            AuditEvent::new("DEPOSIT", "Transaction", "txn-1", "TRANSACTION"),
        );
    }

    #[test]
    fn test_event_builder() {
        let actor = UserId::new();
        let event = AuditEvent::new("CARD_BLOCKED", "Card", "card-1", "CARD")
            .actor(actor)
            .description("blocked: reported stolen")
            .severity(AuditSeverity::High);

        assert_eq!(event.actor, Some(actor));
        assert_eq!(event.description, "blocked: reported stolen");
        assert_eq!(event.severity, AuditSeverity::High);
        assert!(event.before.is_none());
    }
}
