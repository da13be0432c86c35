//! Periodic reminder sweep.
//!
//! The dispatcher runs independently of the request cycle: a long-lived tokio
//! task owned by the process lifecycle, started after the server binds and
//! aborted on shutdown. Each sweep selects confirmed, unsent appointments
//! starting inside the window, sends one reminder per appointment, and stamps
//! `reminder_sent_at` immediately so a crash mid-sweep cannot re-send rows
//! already processed. Failures are isolated per appointment: a dead mail
//! relay skips that row (leaving it eligible for the next sweep) and the
//! batch carries on.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::Appointment;
use crate::domain::notifications::build_reminder_email;
use crate::domain::ports::{
    AppointmentRepository, AppointmentRepositoryError, Notifier, NotifierError, PatientRepository,
    PatientRepositoryError,
};
use crate::domain::scheduling::SchedulingSettings;
use crate::domain::scheduling::service::map_appointment_error;
use crate::domain::scheduling::time_range::resolve_end;
use crate::domain::{Error, notifications::VisitDetails};

/// Window configuration for the sweep.
#[derive(Debug, Clone)]
pub struct ReminderSweepSettings {
    /// Hours ahead of `now` the sweep looks for upcoming appointments.
    pub window_hours: i64,
    /// Minimum lookahead in minutes; extends the window when it is longer.
    pub lookahead_minutes: i64,
}

impl Default for ReminderSweepSettings {
    fn default() -> Self {
        Self {
            window_hours: 24,
            lookahead_minutes: 60,
        }
    }
}

/// Counters reported by one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepSummary {
    /// Candidate appointments examined.
    pub processed: u32,
    /// Reminders successfully dispatched.
    pub sent: u32,
    /// Candidates skipped (no usable recipient, or a per-row failure).
    pub skipped: u32,
}

#[derive(Debug, thiserror::Error)]
enum SweepItemError {
    #[error(transparent)]
    Appointment(#[from] AppointmentRepositoryError),
    #[error(transparent)]
    Patient(#[from] PatientRepositoryError),
    #[error(transparent)]
    Notifier(#[from] NotifierError),
}

/// Sweeps due reminders and dispatches them exactly once per occurrence.
pub struct ReminderDispatcher {
    appointments: Arc<dyn AppointmentRepository>,
    patients: Arc<dyn PatientRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    scheduling: SchedulingSettings,
    sweep: ReminderSweepSettings,
}

impl ReminderDispatcher {
    /// Construct the dispatcher from its collaborator ports.
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        patients: Arc<dyn PatientRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        scheduling: SchedulingSettings,
        sweep: ReminderSweepSettings,
    ) -> Self {
        Self {
            appointments,
            patients,
            notifier,
            clock,
            scheduling,
            sweep,
        }
    }

    /// Run one sweep at the current time.
    pub async fn run_sweep(&self) -> Result<SweepSummary, Error> {
        self.run_sweep_at(self.clock.utc()).await
    }

    /// Run one sweep as of `now`.
    ///
    /// Idempotent per appointment per occurrence: a second call with the same
    /// `now` and no intervening state change dispatches nothing new.
    pub async fn run_sweep_at(&self, now: DateTime<Utc>) -> Result<SweepSummary, Error> {
        let window_start = now;
        let mut window_end = now + Duration::hours(self.sweep.window_hours);
        let lookahead_end = now + Duration::minutes(self.sweep.lookahead_minutes);
        if lookahead_end > window_end {
            window_end = lookahead_end;
        }

        let candidates = self
            .appointments
            .list_reminder_candidates(window_start, window_end)
            .await
            .map_err(map_appointment_error)?;

        let mut summary = SweepSummary {
            processed: u32::try_from(candidates.len()).unwrap_or(u32::MAX),
            ..SweepSummary::default()
        };
        for appointment in &candidates {
            match self.dispatch_one(appointment, now).await {
                Ok(true) => summary.sent += 1,
                Ok(false) => summary.skipped += 1,
                Err(error) => {
                    warn!(
                        appointment_id = %appointment.id,
                        error = %error,
                        "reminder dispatch failed; leaving row for the next sweep"
                    );
                    summary.skipped += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Send the reminder for one appointment; `Ok(false)` means skipped.
    ///
    /// `reminder_sent_at` is only stamped after a successful send, so a
    /// notifier failure leaves the row eligible for retry.
    async fn dispatch_one(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Result<bool, SweepItemError> {
        let Some(patient) = self
            .patients
            .find_by_id(appointment.patient_id, appointment.owner_id)
            .await?
        else {
            return Ok(false);
        };
        let Some(recipient) = patient.contact_email() else {
            return Ok(false);
        };

        let details = VisitDetails {
            start_at: appointment.start_at,
            end_at: resolve_end(
                Some(appointment.start_at),
                appointment.end_at,
                self.scheduling.default_duration_minutes,
            ),
            doctor_name: appointment.doctor_name.clone(),
            department: appointment.department.clone(),
            notes: appointment.notes.clone(),
        };
        let message = build_reminder_email(
            recipient,
            &patient.full_name,
            &self.scheduling.clinic_name,
            &details,
        );
        self.notifier.send(&message).await?;

        let mut updated = appointment.clone();
        updated.reminder_sent_at = Some(now);
        self.appointments.update(&updated).await?;
        Ok(true)
    }

    /// Start the background sweep loop on a fixed period.
    ///
    /// The returned handle owns the task; dropping it without calling
    /// [`DispatcherHandle::shutdown`] leaves the loop running for the process
    /// lifetime, which is the intended production behaviour.
    pub fn spawn_interval(self: Arc<Self>, period: StdDuration) -> DispatcherHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.run_sweep().await {
                    Ok(summary) => info!(
                        processed = summary.processed,
                        sent = summary.sent,
                        skipped = summary.skipped,
                        "reminder sweep finished"
                    ),
                    Err(error) => warn!(error = %error, "reminder sweep failed"),
                }
            }
        });
        DispatcherHandle { task }
    }
}

/// Owner of the background sweep task.
pub struct DispatcherHandle {
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Stop the sweep loop.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;
