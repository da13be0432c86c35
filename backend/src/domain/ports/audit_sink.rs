//! Port abstraction for recording audit events.

use async_trait::async_trait;

use crate::domain::audit::AuditEvent;

/// Port for appending audit events.
///
/// Recording is best-effort by contract: adapters must never raise to the
/// caller. An adapter that fails internally logs the failure and returns, so
/// audit problems cannot abort the primary operation they describe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one event.
    async fn record(&self, event: AuditEvent);
}

/// Sink that discards every event.
///
/// Used in tests where audit behaviour is not under inspection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _event: AuditEvent) {}
}
