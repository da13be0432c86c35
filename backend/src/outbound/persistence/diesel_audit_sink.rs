//! PostgreSQL-backed `AuditSink` implementation using Diesel.
//!
//! Recording is best-effort by the port contract: failures are logged and
//! swallowed so an audit outage can never abort the operation it describes.

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::domain::audit::AuditEvent;
use crate::domain::ports::AuditSink;

use super::models::NewAuditLogRow;
use super::pool::DbPool;
use super::schema::audit_logs;

/// Diesel-backed implementation of the `AuditSink` port.
#[derive(Clone)]
pub struct DieselAuditSink {
    pool: DbPool,
}

impl DieselAuditSink {
    /// Create a new sink with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn try_record(&self, event: &AuditEvent) -> Result<(), String> {
        use diesel_async::RunQueryDsl;

        let mut conn = self.pool.get().await.map_err(|err| err.to_string())?;
        let context = event.context.as_ref();
        let row = NewAuditLogRow {
            id: Uuid::new_v4(),
            owner_id: event.owner_id,
            action: &event.action,
            entity_type: &event.entity_type,
            entity_id: event.entity_id,
            summary: &event.summary,
            metadata: event.metadata.as_ref(),
            ip_address: context.and_then(|ctx| ctx.ip_address.as_deref()),
            user_agent: context.and_then(|ctx| ctx.user_agent.as_deref()),
            request_id: context.and_then(|ctx| ctx.request_id.as_deref()),
            created_at: chrono::Utc::now(),
        };
        diesel::insert_into(audit_logs::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map_err(|err| err.to_string())?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for DieselAuditSink {
    async fn record(&self, event: AuditEvent) {
        if let Err(message) = self.try_record(&event).await {
            warn!(
                action = %event.action,
                error = %message,
                "audit log write failed; continuing"
            );
        }
    }
}
