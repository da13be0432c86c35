//! Appointment lifecycle orchestration.
//!
//! Every mutating operation follows the same shape: validate before any
//! write, persist exactly one aggregate, then emit audit events and
//! notifications. Validation and conflict failures abort before mutation;
//! audit failures are swallowed by the sink contract; notification failures
//! on synchronous paths surface to the caller after the write has landed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use uuid::Uuid;

use crate::domain::appointment::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentSnapshot, AppointmentStatus,
    DEFAULT_EMAIL_LEAD_MINUTES, DEFAULT_SMS_LEAD_MINUTES, normalize_doctor_name,
};
use crate::domain::audit::{AuditEvent, RequestContext};
use crate::domain::notifications::{
    VisitDetails, build_cancellation_email, build_confirmation_email, build_update_email,
};
use crate::domain::patient::Patient;
use crate::domain::ports::{
    AppointmentRepository, AppointmentRepositoryError, AuditSink, Notifier, PatientRepository,
    PatientRepositoryError,
};
use crate::domain::{Error, scheduling::SchedulingSettings};

use super::{overlap, reminder, time_range};

/// Read-only outcome of a simulated reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderSimulation {
    /// Channels that would fire.
    pub channels: Vec<String>,
    /// When the reminder is scheduled to fire.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Operator-facing description.
    pub message: String,
}

/// Driving service for appointment lifecycle operations.
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    patients: Arc<dyn PatientRepository>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    settings: SchedulingSettings,
}

fn should_send_confirmation(status: AppointmentStatus) -> bool {
    matches!(
        status,
        AppointmentStatus::Confirmed | AppointmentStatus::Scheduled
    )
}

fn should_send_update(status: AppointmentStatus) -> bool {
    matches!(
        status,
        AppointmentStatus::Confirmed | AppointmentStatus::Scheduled
    )
}

pub(crate) fn map_appointment_error(error: AppointmentRepositoryError) -> Error {
    match error {
        AppointmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("appointment repository unavailable: {message}"))
        }
        AppointmentRepositoryError::Query { message } => {
            Error::internal(format!("appointment repository error: {message}"))
        }
    }
}

fn map_patient_error(error: PatientRepositoryError) -> Error {
    match error {
        PatientRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("patient repository unavailable: {message}"))
        }
        PatientRepositoryError::Query { message } => {
            Error::internal(format!("patient repository error: {message}"))
        }
    }
}

fn validate_lead_minutes(email: Option<i32>, sms: Option<i32>) -> Result<(), Error> {
    if email.is_some_and(|minutes| minutes < 0) || sms.is_some_and(|minutes| minutes < 0) {
        return Err(Error::invalid_request(
            "Reminder lead time must be non-negative.",
        ));
    }
    Ok(())
}

impl AppointmentService {
    /// Construct the service from its collaborator ports.
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        patients: Arc<dyn PatientRepository>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        settings: SchedulingSettings,
    ) -> Self {
        Self {
            appointments,
            patients,
            notifier,
            audit,
            clock,
            settings,
        }
    }

    fn visit_details(
        &self,
        start_at: DateTime<Utc>,
        end_at: Option<DateTime<Utc>>,
        doctor_name: &str,
        department: Option<&str>,
        notes: Option<&str>,
    ) -> VisitDetails {
        VisitDetails {
            start_at,
            end_at: time_range::resolve_end(
                Some(start_at),
                end_at,
                self.settings.default_duration_minutes,
            ),
            doctor_name: doctor_name.to_owned(),
            department: department.map(str::to_owned),
            notes: notes.map(str::to_owned),
        }
    }

    fn current_details(&self, appointment: &Appointment) -> VisitDetails {
        self.visit_details(
            appointment.start_at,
            appointment.end_at,
            &appointment.doctor_name,
            appointment.department.as_deref(),
            appointment.notes.as_deref(),
        )
    }

    fn snapshot_details(&self, snapshot: &AppointmentSnapshot) -> VisitDetails {
        self.visit_details(
            snapshot.start_at,
            snapshot.end_at,
            &snapshot.doctor_name,
            snapshot.department.as_deref(),
            snapshot.notes.as_deref(),
        )
    }

    async fn load(&self, id: Uuid, owner_id: Uuid) -> Result<Appointment, Error> {
        self.appointments
            .find_by_id(id, owner_id)
            .await
            .map_err(map_appointment_error)?
            .ok_or_else(|| Error::not_found("Appointment not found"))
    }

    async fn load_patient(&self, id: Uuid, owner_id: Uuid) -> Result<Patient, Error> {
        self.patients
            .find_by_id(id, owner_id)
            .await
            .map_err(map_patient_error)?
            .ok_or_else(|| Error::not_found("Patient not found"))
    }

    async fn guard_overlap(
        &self,
        owner_id: Uuid,
        exclude_id: Option<Uuid>,
        start_at: DateTime<Utc>,
        end_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        let siblings = self
            .appointments
            .list_active(owner_id, exclude_id)
            .await
            .map_err(map_appointment_error)?;
        overlap::assert_no_overlap(
            Some(start_at),
            end_at,
            &siblings,
            self.settings.default_duration_minutes,
        )
        .map_err(|overlap::OverlapConflict| Error::overlap_conflict())
    }

    async fn dispatch(
        &self,
        message: crate::domain::notifications::EmailMessage,
    ) -> Result<(), Error> {
        self.notifier
            .send(&message)
            .await
            .map_err(|error| Error::notification_failed(error.to_string()))
    }

    async fn send_confirmation(
        &self,
        appointment: &Appointment,
        patient: &Patient,
    ) -> Result<(), Error> {
        let Some(recipient) = patient.contact_email() else {
            return Ok(());
        };
        if !should_send_confirmation(appointment.status) {
            return Ok(());
        }
        let message = build_confirmation_email(
            recipient,
            &patient.full_name,
            &self.settings.clinic_name,
            &self.current_details(appointment),
        );
        self.dispatch(message).await
    }

    async fn send_cancellation(
        &self,
        snapshot: &AppointmentSnapshot,
        patient: &Patient,
    ) -> Result<(), Error> {
        let Some(recipient) = patient.contact_email() else {
            return Ok(());
        };
        let message = build_cancellation_email(
            recipient,
            &patient.full_name,
            &self.settings.clinic_name,
            &self.snapshot_details(snapshot),
        );
        self.dispatch(message).await
    }

    async fn send_update(
        &self,
        snapshot: &AppointmentSnapshot,
        appointment: &Appointment,
        patient: &Patient,
    ) -> Result<(), Error> {
        let Some(recipient) = patient.contact_email() else {
            return Ok(());
        };
        let message = build_update_email(
            recipient,
            &patient.full_name,
            &self.settings.clinic_name,
            &self.snapshot_details(snapshot),
            &self.current_details(appointment),
        );
        self.dispatch(message).await
    }

    /// Create an appointment for the owner's patient.
    pub async fn create(
        &self,
        owner_id: Uuid,
        draft: AppointmentDraft,
        context: Option<RequestContext>,
    ) -> Result<Appointment, Error> {
        let now = self.clock.utc();
        let patient = self.load_patient(draft.patient_id, owner_id).await?;

        time_range::validate_range(Some(draft.start_at), draft.end_at)
            .map_err(|time_range::InvalidTimeRange| Error::invalid_time_range())?;
        validate_lead_minutes(
            draft.reminder_email_lead_minutes,
            draft.reminder_sms_lead_minutes,
        )?;

        let status = draft.status.unwrap_or_default();
        if status.is_schedulable() {
            self.guard_overlap(owner_id, None, draft.start_at, draft.end_at)
                .await?;
        }

        let mut appointment = Appointment {
            id: Uuid::new_v4(),
            owner_id,
            patient_id: patient.id,
            doctor_name: normalize_doctor_name(draft.doctor_name.as_deref()),
            department: draft.department,
            start_at: draft.start_at,
            end_at: draft.end_at,
            notes: draft.notes,
            status,
            reminder_email_enabled: draft.reminder_email_enabled.unwrap_or(false),
            reminder_sms_enabled: draft.reminder_sms_enabled.unwrap_or(false),
            reminder_email_lead_minutes: Some(
                draft
                    .reminder_email_lead_minutes
                    .unwrap_or(DEFAULT_EMAIL_LEAD_MINUTES),
            ),
            reminder_sms_lead_minutes: Some(
                draft
                    .reminder_sms_lead_minutes
                    .unwrap_or(DEFAULT_SMS_LEAD_MINUTES),
            ),
            reminder_next_run_at: None,
            reminder_sent_at: None,
            created_at: now,
        };
        // Creation has no prior reminder state worth auditing.
        let _auto_disabled = reminder::enforce(&mut appointment, false, now);

        self.appointments
            .insert(&appointment)
            .await
            .map_err(map_appointment_error)?;

        self.send_confirmation(&appointment, &patient).await?;

        self.audit
            .record(
                AuditEvent::new(owner_id, "appointment.create", "appointment", "Created appointment")
                    .with_entity_id(appointment.id)
                    .with_metadata(json!({
                        "patient_id": appointment.patient_id,
                        "start_at": appointment.start_at,
                        "end_at": appointment.end_at,
                        "status": appointment.status,
                    }))
                    .with_context(context),
            )
            .await;

        Ok(appointment)
    }

    /// Fetch one appointment.
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Appointment, Error> {
        self.load(id, owner_id).await
    }

    /// List the owner's appointments.
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Appointment>, Error> {
        self.appointments
            .list_for_owner(owner_id)
            .await
            .map_err(map_appointment_error)
    }

    /// Apply a full or partial update; unspecified fields stay untouched.
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: AppointmentPatch,
        context: Option<RequestContext>,
    ) -> Result<Appointment, Error> {
        let now = self.clock.utc();
        let mut appointment = self.load(id, owner_id).await?;
        let snapshot = appointment.snapshot();

        let merged_start = patch.merged_start(&appointment);
        let merged_end = patch.merged_end(&appointment);
        let merged_status = patch.merged_status(&appointment);

        time_range::validate_range(Some(merged_start), merged_end)
            .map_err(|time_range::InvalidTimeRange| Error::invalid_time_range())?;
        validate_lead_minutes(
            patch.reminder_email_lead_minutes,
            patch.reminder_sms_lead_minutes,
        )?;

        if merged_status.is_schedulable() {
            self.guard_overlap(owner_id, Some(appointment.id), merged_start, merged_end)
                .await?;
        }

        let previously_enabled = snapshot.any_reminder_channel_enabled();
        let touched_reminders = patch.touches_reminder_settings();

        patch.merge_into(&mut appointment);
        let auto_disabled = reminder::enforce(&mut appointment, previously_enabled, now);

        self.appointments
            .update(&appointment)
            .await
            .map_err(map_appointment_error)?;

        let (action, summary) = derive_update_action(&snapshot, &appointment);
        self.audit
            .record(
                AuditEvent::new(owner_id, action, "appointment", summary)
                    .with_entity_id(appointment.id)
                    .with_metadata(snapshot.diff_metadata(&appointment))
                    .with_context(context.clone()),
            )
            .await;

        let changed_reminder_settings = snapshot.changed_reminder_settings(&appointment);
        if touched_reminders && !changed_reminder_settings.is_empty() && !auto_disabled {
            self.audit
                .record(
                    AuditEvent::new(
                        owner_id,
                        "appointment.reminder_updated",
                        "appointment",
                        "Updated reminder settings",
                    )
                    .with_entity_id(appointment.id)
                    .with_metadata(json!({ "changed_fields": changed_reminder_settings }))
                    .with_context(context.clone()),
                )
                .await;
        }
        if auto_disabled && previously_enabled {
            self.audit
                .record(
                    AuditEvent::new(
                        owner_id,
                        "appointment.reminder_disabled_auto",
                        "appointment",
                        "Reminders disabled automatically",
                    )
                    .with_entity_id(appointment.id)
                    .with_metadata(json!({ "status": appointment.status }))
                    .with_context(context),
                )
                .await;
        }

        let patient = self
            .load_patient(appointment.patient_id, owner_id)
            .await?;
        if appointment.status == AppointmentStatus::Cancelled {
            if snapshot.status != AppointmentStatus::Cancelled {
                self.send_cancellation(&snapshot, &patient).await?;
            }
        } else if appointment.status == AppointmentStatus::Confirmed
            && snapshot.status != AppointmentStatus::Confirmed
        {
            self.send_confirmation(&appointment, &patient).await?;
        } else if should_send_update(appointment.status)
            && snapshot.has_visible_changes(&appointment)
        {
            self.send_update(&snapshot, &appointment, &patient).await?;
        }

        Ok(appointment)
    }

    /// Cancel an appointment; a no-op when already cancelled.
    pub async fn cancel(
        &self,
        owner_id: Uuid,
        id: Uuid,
        context: Option<RequestContext>,
    ) -> Result<Appointment, Error> {
        let now = self.clock.utc();
        let mut appointment = self.load(id, owner_id).await?;
        if appointment.status == AppointmentStatus::Cancelled {
            return Ok(appointment);
        }

        let snapshot = appointment.snapshot();
        let previously_enabled = snapshot.any_reminder_channel_enabled();
        appointment.status = AppointmentStatus::Cancelled;
        let auto_disabled = reminder::enforce(&mut appointment, previously_enabled, now);

        self.appointments
            .update(&appointment)
            .await
            .map_err(map_appointment_error)?;

        self.audit
            .record(
                AuditEvent::new(owner_id, "appointment.cancel", "appointment", "Cancelled appointment")
                    .with_entity_id(appointment.id)
                    .with_metadata(json!({ "status": appointment.status }))
                    .with_context(context.clone()),
            )
            .await;
        if auto_disabled && previously_enabled {
            self.audit
                .record(
                    AuditEvent::new(
                        owner_id,
                        "appointment.reminder_disabled_auto",
                        "appointment",
                        "Reminders disabled automatically",
                    )
                    .with_entity_id(appointment.id)
                    .with_metadata(json!({ "status": appointment.status }))
                    .with_context(context),
                )
                .await;
        }

        let patient = self
            .load_patient(appointment.patient_id, owner_id)
            .await?;
        self.send_cancellation(&snapshot, &patient).await?;

        Ok(appointment)
    }

    /// Mark an appointment completed; a no-op when already completed.
    ///
    /// Completion sends no notification.
    pub async fn complete(
        &self,
        owner_id: Uuid,
        id: Uuid,
        context: Option<RequestContext>,
    ) -> Result<Appointment, Error> {
        let now = self.clock.utc();
        let mut appointment = self.load(id, owner_id).await?;
        if appointment.status == AppointmentStatus::Completed {
            return Ok(appointment);
        }

        let previously_enabled = appointment.any_reminder_channel_enabled();
        appointment.status = AppointmentStatus::Completed;
        let auto_disabled = reminder::enforce(&mut appointment, previously_enabled, now);

        self.appointments
            .update(&appointment)
            .await
            .map_err(map_appointment_error)?;

        self.audit
            .record(
                AuditEvent::new(owner_id, "appointment.complete", "appointment", "Completed appointment")
                    .with_entity_id(appointment.id)
                    .with_metadata(json!({ "status": appointment.status }))
                    .with_context(context.clone()),
            )
            .await;
        if auto_disabled && previously_enabled {
            self.audit
                .record(
                    AuditEvent::new(
                        owner_id,
                        "appointment.reminder_disabled_auto",
                        "appointment",
                        "Reminders disabled automatically",
                    )
                    .with_entity_id(appointment.id)
                    .with_metadata(json!({ "status": appointment.status }))
                    .with_context(context),
                )
                .await;
        }

        Ok(appointment)
    }

    /// Hard-delete an appointment.
    pub async fn delete(
        &self,
        owner_id: Uuid,
        id: Uuid,
        context: Option<RequestContext>,
    ) -> Result<(), Error> {
        let appointment = self.load(id, owner_id).await?;
        self.appointments
            .delete(appointment.id, owner_id)
            .await
            .map_err(map_appointment_error)?;

        self.audit
            .record(
                AuditEvent::new(owner_id, "appointment.delete", "appointment", "Deleted appointment")
                    .with_entity_id(appointment.id)
                    .with_context(context),
            )
            .await;
        Ok(())
    }

    /// Diagnose what a reminder for this appointment would do, without
    /// sending anything.
    pub async fn simulate_reminder(
        &self,
        owner_id: Uuid,
        id: Uuid,
        context: Option<RequestContext>,
    ) -> Result<ReminderSimulation, Error> {
        let now = self.clock.utc();
        let appointment = self.load(id, owner_id).await?;

        if appointment.status != AppointmentStatus::Confirmed {
            return Err(Error::invalid_state(
                "Reminders are only available for confirmed appointments.",
            ));
        }
        if appointment.start_at <= now {
            return Err(Error::invalid_state(
                "Reminders are only available for future appointments.",
            ));
        }

        let mut channels = Vec::new();
        if appointment.reminder_email_enabled {
            channels.push("email".to_owned());
        }
        if appointment.reminder_sms_enabled {
            channels.push("sms".to_owned());
        }
        if channels.is_empty() {
            return Err(Error::invalid_state(
                "No reminders are enabled for this appointment.",
            ));
        }

        let scheduled_for = appointment.reminder_next_run_at.or_else(|| {
            reminder::compute_next_run(
                Some(appointment.start_at),
                appointment.reminder_email_enabled,
                appointment.email_lead_minutes(),
                appointment.reminder_sms_enabled,
                appointment.sms_lead_minutes(),
            )
        });

        self.audit
            .record(
                AuditEvent::new(
                    owner_id,
                    "appointment.reminder_simulated",
                    "appointment",
                    "Simulated appointment reminder",
                )
                .with_entity_id(appointment.id)
                .with_metadata(json!({
                    "channels": &channels,
                    "scheduled_for": scheduled_for,
                }))
                .with_context(context),
            )
            .await;

        Ok(ReminderSimulation {
            channels,
            scheduled_for,
            message: "Reminder simulated (no message sent).".to_owned(),
        })
    }
}

fn derive_update_action(
    snapshot: &AppointmentSnapshot,
    appointment: &Appointment,
) -> (&'static str, &'static str) {
    if snapshot.status != appointment.status {
        return match appointment.status {
            AppointmentStatus::Cancelled => ("appointment.cancel", "Cancelled appointment"),
            AppointmentStatus::Completed => ("appointment.complete", "Completed appointment"),
            AppointmentStatus::Confirmed => ("appointment.confirmed", "Confirmed appointment"),
            AppointmentStatus::Unconfirmed | AppointmentStatus::Scheduled => {
                ("appointment.update", "Updated appointment")
            }
        };
    }
    if snapshot.start_at != appointment.start_at || snapshot.end_at != appointment.end_at {
        return ("appointment.reschedule", "Rescheduled appointment");
    }
    ("appointment.update", "Updated appointment")
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
