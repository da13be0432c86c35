//! Appointment HTTP handlers.
//!
//! ```text
//! GET    /api/v1/appointments
//! POST   /api/v1/appointments
//! GET    /api/v1/appointments/{id}
//! PUT    /api/v1/appointments/{id}      (full update)
//! PATCH  /api/v1/appointments/{id}      (partial update)
//! PATCH  /api/v1/appointments/{id}/cancel
//! PATCH  /api/v1/appointments/{id}/complete
//! DELETE /api/v1/appointments/{id}
//! POST   /api/v1/appointments/{id}/reminders/simulate
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, route, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::appointment::{AppointmentDraft, AppointmentPatch, AppointmentStatus};
use crate::domain::{Appointment, ReminderSimulation};
use crate::inbound::http::ApiResult;
use crate::inbound::http::context::request_context;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Distinguish "field absent" from "field explicitly null" for nullable
/// fields: absence keeps the stored value, null clears it.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request payload for creating an appointment.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct CreateAppointmentRequest {
    /// Patient the appointment is for.
    pub patient_id: Uuid,
    /// Doctor name; blank or absent defaults to "TBD".
    pub doctor_name: Option<String>,
    /// Optional department label.
    pub department: Option<String>,
    /// Scheduled start.
    pub start_at: DateTime<Utc>,
    /// Optional explicit end.
    pub end_at: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Initial status; defaults to `Unconfirmed`.
    pub status: Option<AppointmentStatus>,
    /// Email reminder channel toggle.
    pub reminder_email_enabled: Option<bool>,
    /// SMS reminder channel toggle.
    pub reminder_sms_enabled: Option<bool>,
    /// Email lead time in minutes.
    pub reminder_email_lead_minutes: Option<i32>,
    /// SMS lead time in minutes.
    pub reminder_sms_lead_minutes: Option<i32>,
}

impl From<CreateAppointmentRequest> for AppointmentDraft {
    fn from(value: CreateAppointmentRequest) -> Self {
        Self {
            patient_id: value.patient_id,
            doctor_name: value.doctor_name,
            department: value.department,
            start_at: value.start_at,
            end_at: value.end_at,
            notes: value.notes,
            status: value.status,
            reminder_email_enabled: value.reminder_email_enabled,
            reminder_sms_enabled: value.reminder_sms_enabled,
            reminder_email_lead_minutes: value.reminder_email_lead_minutes,
            reminder_sms_lead_minutes: value.reminder_sms_lead_minutes,
        }
    }
}

/// Request payload for full or partial appointment updates.
///
/// Absent fields are left untouched. `endAt`, `department`, and `notes`
/// accept an explicit `null` to clear the stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct UpdateAppointmentRequest {
    /// Replacement doctor name.
    pub doctor_name: Option<String>,
    /// Replacement or cleared department.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub department: Option<Option<String>>,
    /// Replacement start.
    pub start_at: Option<DateTime<Utc>>,
    /// Replacement or cleared end.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_at: Option<Option<DateTime<Utc>>>,
    /// Replacement or cleared notes.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    /// Replacement status.
    pub status: Option<AppointmentStatus>,
    /// Email reminder channel toggle.
    pub reminder_email_enabled: Option<bool>,
    /// SMS reminder channel toggle.
    pub reminder_sms_enabled: Option<bool>,
    /// Email lead time in minutes.
    pub reminder_email_lead_minutes: Option<i32>,
    /// SMS lead time in minutes.
    pub reminder_sms_lead_minutes: Option<i32>,
}

impl From<UpdateAppointmentRequest> for AppointmentPatch {
    fn from(value: UpdateAppointmentRequest) -> Self {
        Self {
            doctor_name: value.doctor_name,
            department: value.department,
            start_at: value.start_at,
            end_at: value.end_at,
            notes: value.notes,
            status: value.status,
            reminder_email_enabled: value.reminder_email_enabled,
            reminder_sms_enabled: value.reminder_sms_enabled,
            reminder_email_lead_minutes: value.reminder_email_lead_minutes,
            reminder_sms_lead_minutes: value.reminder_sms_lead_minutes,
        }
    }
}

/// Appointment projection returned by every appointment endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    /// Appointment identifier.
    pub id: Uuid,
    /// Patient identifier.
    pub patient_id: Uuid,
    /// Doctor display name.
    pub doctor_name: String,
    /// Department label.
    pub department: Option<String>,
    /// Scheduled start.
    pub start_at: DateTime<Utc>,
    /// Explicit end, when one was recorded.
    pub end_at: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Lifecycle status.
    pub status: AppointmentStatus,
    /// Email reminder channel toggle.
    pub reminder_email_enabled: bool,
    /// SMS reminder channel toggle.
    pub reminder_sms_enabled: bool,
    /// Email lead time in minutes.
    pub reminder_email_lead_minutes: Option<i32>,
    /// SMS lead time in minutes.
    pub reminder_sms_lead_minutes: Option<i32>,
    /// Derived next reminder fire time.
    pub reminder_next_run_at: Option<DateTime<Utc>>,
    /// When the current occurrence's reminder went out.
    pub reminder_sent_at: Option<DateTime<Utc>>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(value: Appointment) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            doctor_name: value.doctor_name,
            department: value.department,
            start_at: value.start_at,
            end_at: value.end_at,
            notes: value.notes,
            status: value.status,
            reminder_email_enabled: value.reminder_email_enabled,
            reminder_sms_enabled: value.reminder_sms_enabled,
            reminder_email_lead_minutes: value.reminder_email_lead_minutes,
            reminder_sms_lead_minutes: value.reminder_sms_lead_minutes,
            reminder_next_run_at: value.reminder_next_run_at,
            reminder_sent_at: value.reminder_sent_at,
            created_at: value.created_at,
        }
    }
}

/// Response payload for the reminder simulation endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulateReminderResponse {
    /// Always true on success.
    pub ok: bool,
    /// Marks the payload as a dry run.
    pub simulated: bool,
    /// Channels that would fire.
    pub channels: Vec<String>,
    /// When the reminder is scheduled to fire.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Operator-facing description.
    pub message: String,
}

impl From<ReminderSimulation> for SimulateReminderResponse {
    fn from(value: ReminderSimulation) -> Self {
        Self {
            ok: true,
            simulated: true,
            channels: value.channels,
            scheduled_for: value.scheduled_for,
            message: value.message,
        }
    }
}

/// List the owner's appointments.
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    responses(
        (status = 200, description = "Appointments", body = [AppointmentResponse]),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "listAppointments"
)]
#[get("/appointments")]
pub async fn list_appointments(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<AppointmentResponse>>> {
    let owner_id = session.require_owner_id()?;
    let appointments = state.appointments.list(owner_id).await?;
    Ok(web::Json(
        appointments
            .into_iter()
            .map(AppointmentResponse::from)
            .collect(),
    ))
}

/// Fetch one appointment.
#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    responses(
        (status = 200, description = "Appointment", body = AppointmentResponse),
        (status = 404, description = "Not found", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "getAppointment"
)]
#[get("/appointments/{id}")]
pub async fn get_appointment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<AppointmentResponse>> {
    let owner_id = session.require_owner_id()?;
    let appointment = state.appointments.get(owner_id, path.into_inner()).await?;
    Ok(web::Json(appointment.into()))
}

/// Create an appointment.
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Created", body = AppointmentResponse),
        (status = 400, description = "Overlap or invalid request", body = crate::domain::Error),
        (status = 404, description = "Patient not found", body = crate::domain::Error),
        (status = 422, description = "Invalid time range", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "createAppointment"
)]
#[post("/appointments")]
pub async fn create_appointment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateAppointmentRequest>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let owner_id = session.require_owner_id()?;
    let context = Some(request_context(&req));
    let created = state
        .appointments
        .create(owner_id, payload.into_inner().into(), context)
        .await?;
    Ok(HttpResponse::Created().json(AppointmentResponse::from(created)))
}

/// Apply a full (`PUT`) or partial (`PATCH`) update.
#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}",
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Updated", body = AppointmentResponse),
        (status = 400, description = "Overlap or invalid request", body = crate::domain::Error),
        (status = 404, description = "Not found", body = crate::domain::Error),
        (status = 422, description = "Invalid time range", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "updateAppointment"
)]
#[route("/appointments/{id}", method = "PUT", method = "PATCH")]
pub async fn update_appointment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateAppointmentRequest>,
    req: HttpRequest,
) -> ApiResult<web::Json<AppointmentResponse>> {
    let owner_id = session.require_owner_id()?;
    let context = Some(request_context(&req));
    let updated = state
        .appointments
        .update(owner_id, path.into_inner(), payload.into_inner().into(), context)
        .await?;
    Ok(web::Json(updated.into()))
}

/// Cancel an appointment (no-op when already cancelled).
#[utoipa::path(
    patch,
    path = "/api/v1/appointments/{id}/cancel",
    responses(
        (status = 200, description = "Cancelled", body = AppointmentResponse),
        (status = 404, description = "Not found", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "cancelAppointment"
)]
#[patch("/appointments/{id}/cancel")]
pub async fn cancel_appointment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> ApiResult<web::Json<AppointmentResponse>> {
    let owner_id = session.require_owner_id()?;
    let context = Some(request_context(&req));
    let cancelled = state
        .appointments
        .cancel(owner_id, path.into_inner(), context)
        .await?;
    Ok(web::Json(cancelled.into()))
}

/// Mark an appointment completed (no-op when already completed).
#[utoipa::path(
    patch,
    path = "/api/v1/appointments/{id}/complete",
    responses(
        (status = 200, description = "Completed", body = AppointmentResponse),
        (status = 404, description = "Not found", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "completeAppointment"
)]
#[patch("/appointments/{id}/complete")]
pub async fn complete_appointment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> ApiResult<web::Json<AppointmentResponse>> {
    let owner_id = session.require_owner_id()?;
    let context = Some(request_context(&req));
    let completed = state
        .appointments
        .complete(owner_id, path.into_inner(), context)
        .await?;
    Ok(web::Json(completed.into()))
}

/// Hard-delete an appointment.
#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "deleteAppointment"
)]
#[delete("/appointments/{id}")]
pub async fn delete_appointment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let owner_id = session.require_owner_id()?;
    let context = Some(request_context(&req));
    state
        .appointments
        .delete(owner_id, path.into_inner(), context)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Dry-run the reminder for one appointment.
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/reminders/simulate",
    responses(
        (status = 200, description = "Simulation result", body = SimulateReminderResponse),
        (status = 400, description = "Preconditions not met", body = crate::domain::Error),
        (status = 404, description = "Not found", body = crate::domain::Error)
    ),
    tags = ["appointments"],
    operation_id = "simulateReminder"
)]
#[post("/appointments/{id}/reminders/simulate")]
pub async fn simulate_reminder(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> ApiResult<web::Json<SimulateReminderResponse>> {
    let owner_id = session.require_owner_id()?;
    let context = Some(request_context(&req));
    let simulation = state
        .appointments
        .simulate_reminder(owner_id, path.into_inner(), context)
        .await?;
    Ok(web::Json(simulation.into()))
}

#[cfg(test)]
#[path = "appointments_tests.rs"]
mod appointments_tests;
