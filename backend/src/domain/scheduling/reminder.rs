//! Reminder eligibility and next-run derivation.
//!
//! Reminder state is derived, never authoritative: [`enforce`] runs on every
//! create and every transition so the stored channel flags and next-run
//! timestamp can never drift from the appointment's status and start time.
//!
//! The eligibility rule is deliberately strict: only explicitly confirmed,
//! not-yet-started appointments carry reminders. The dispatch sweep applies
//! the same predicate when selecting candidates.

use chrono::{DateTime, Duration, Utc};

use crate::domain::appointment::{
    Appointment, AppointmentStatus, DEFAULT_EMAIL_LEAD_MINUTES, DEFAULT_SMS_LEAD_MINUTES,
};

/// Whether an appointment in `status` starting at `start_at` may carry
/// reminders at `now`.
pub fn is_reminder_eligible(
    status: AppointmentStatus,
    start_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    status == AppointmentStatus::Confirmed && start_at.is_some_and(|start| start > now)
}

/// Earliest fire time across the enabled channels, or `None` when no channel
/// is enabled or no start exists.
pub fn compute_next_run(
    start_at: Option<DateTime<Utc>>,
    email_enabled: bool,
    email_lead_minutes: i32,
    sms_enabled: bool,
    sms_lead_minutes: i32,
) -> Option<DateTime<Utc>> {
    let start = start_at?;
    let mut candidates = Vec::new();
    if email_enabled {
        candidates.push(start - Duration::minutes(i64::from(email_lead_minutes)));
    }
    if sms_enabled {
        candidates.push(start - Duration::minutes(i64::from(sms_lead_minutes)));
    }
    candidates.into_iter().min()
}

/// Re-derive the appointment's reminder state in place.
///
/// Ineligible appointments get both channel flags forced off and the next-run
/// cleared; the return value reports whether that auto-disable suppressed a
/// previously enabled reminder (an audit-worthy event). Eligible appointments
/// get absent lead times defaulted and the next-run recomputed.
pub fn enforce(appointment: &mut Appointment, previously_enabled: bool, now: DateTime<Utc>) -> bool {
    if !is_reminder_eligible(appointment.status, Some(appointment.start_at), now) {
        let auto_disabled = appointment.reminder_email_enabled
            || appointment.reminder_sms_enabled
            || previously_enabled;
        appointment.reminder_email_enabled = false;
        appointment.reminder_sms_enabled = false;
        appointment.reminder_next_run_at = None;
        return auto_disabled;
    }

    if appointment.reminder_email_lead_minutes.is_none() {
        appointment.reminder_email_lead_minutes = Some(DEFAULT_EMAIL_LEAD_MINUTES);
    }
    if appointment.reminder_sms_lead_minutes.is_none() {
        appointment.reminder_sms_lead_minutes = Some(DEFAULT_SMS_LEAD_MINUTES);
    }
    appointment.reminder_next_run_at = compute_next_run(
        Some(appointment.start_at),
        appointment.reminder_email_enabled,
        appointment.email_lead_minutes(),
        appointment.reminder_sms_enabled,
        appointment.sms_lead_minutes(),
    );
    false
}
