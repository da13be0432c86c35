//! Reminder sweep HTTP handler.
//!
//! The sweep normally runs on its background timer; this endpoint lets an
//! operator trigger the same pass synchronously and read the counters.

use actix_web::{HttpRequest, post, web};
use serde_json::json;

use crate::domain::AuditEvent;
use crate::domain::SweepSummary;
use crate::inbound::http::ApiResult;
use crate::inbound::http::context::request_context;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Run one reminder sweep now and report `{processed, sent, skipped}`.
#[utoipa::path(
    post,
    path = "/api/v1/reminders/run",
    responses(
        (status = 200, description = "Sweep summary", body = SweepSummary),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    tags = ["reminders"],
    operation_id = "runReminders"
)]
#[post("/reminders/run")]
pub async fn run_reminders(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<web::Json<SweepSummary>> {
    let owner_id = session.require_owner_id()?;
    let summary = state.dispatcher.run_sweep().await?;
    state
        .audit
        .record(
            AuditEvent::new(owner_id, "reminder.run", "reminder", "Ran reminder sweep")
                .with_metadata(json!({
                    "processed": summary.processed,
                    "sent": summary.sent,
                    "skipped": summary.skipped,
                }))
                .with_context(Some(request_context(&req))),
        )
        .await;
    Ok(web::Json(summary))
}
