//! Appointment aggregate and its mutation value objects.
//!
//! The appointment is the centre of the scheduling core: status drives
//! overlap checking and reminder eligibility, and every mutation flows
//! through [`AppointmentPatch`] / [`AppointmentSnapshot`] so audit diffs fall
//! out of the same merge the update applies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Doctor name applied when the caller leaves the field blank or absent.
pub const DEFAULT_DOCTOR_NAME: &str = "TBD";

/// Default email reminder lead time when the field was never set.
pub const DEFAULT_EMAIL_LEAD_MINUTES: i32 = 1440;

/// Default SMS reminder lead time when the field was never set.
pub const DEFAULT_SMS_LEAD_MINUTES: i32 = 120;

/// Appointment lifecycle status.
///
/// `Unconfirmed`, `Confirmed`, and `Scheduled` are the active states that
/// participate in overlap checking; `Completed` and `Cancelled` are terminal
/// by policy (transitions out are unusual but not forbidden, and reminder
/// state is recomputed on every transition either way).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AppointmentStatus {
    /// Booked but not yet confirmed by the patient.
    Unconfirmed,
    /// Confirmed by the patient; the only reminder-eligible status.
    Confirmed,
    /// Legacy "firm booking" status retained for older records.
    Scheduled,
    /// The visit took place.
    Completed,
    /// The visit was called off.
    Cancelled,
}

impl AppointmentStatus {
    /// Whether this status participates in overlap checks.
    pub fn is_schedulable(self) -> bool {
        matches!(self, Self::Unconfirmed | Self::Confirmed | Self::Scheduled)
    }

    /// Stable string form used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unconfirmed => "Unconfirmed",
            Self::Confirmed => "Confirmed",
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown appointment status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for AppointmentStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Unconfirmed" => Ok(Self::Unconfirmed),
            "Confirmed" => Ok(Self::Confirmed),
            "Scheduled" => Ok(Self::Scheduled),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

/// Appointment aggregate, owner-scoped.
///
/// ## Invariants
/// - `end_at`, when present, is strictly after `start_at`.
/// - `reminder_next_run_at` is non-null only while the appointment is
///   reminder-eligible and at least one channel is enabled.
/// - `reminder_sent_at` is set at most once per scheduled occurrence and
///   suppresses duplicate sends until reminder state is recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    /// Identifier, unique within the owner's tenant.
    pub id: Uuid,
    /// Admin tenant that owns this appointment.
    pub owner_id: Uuid,
    /// Patient attending; must belong to the same owner.
    pub patient_id: Uuid,
    /// Doctor display name, never blank (defaults to [`DEFAULT_DOCTOR_NAME`]).
    pub doctor_name: String,
    /// Optional department label.
    pub department: Option<String>,
    /// Scheduled start.
    pub start_at: DateTime<Utc>,
    /// Optional explicit end; resolved lazily against the default duration.
    pub end_at: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Lifecycle status.
    pub status: AppointmentStatus,
    /// Whether the email reminder channel is enabled.
    pub reminder_email_enabled: bool,
    /// Whether the SMS reminder channel is enabled (no dispatch implemented;
    /// the flag only feeds next-run derivation).
    pub reminder_sms_enabled: bool,
    /// Email lead time in minutes; `None` means "never set".
    pub reminder_email_lead_minutes: Option<i32>,
    /// SMS lead time in minutes; `None` means "never set".
    pub reminder_sms_lead_minutes: Option<i32>,
    /// Derived next reminder fire time.
    pub reminder_next_run_at: Option<DateTime<Utc>>,
    /// When the reminder for the current occurrence was dispatched.
    pub reminder_sent_at: Option<DateTime<Utc>>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether any reminder channel is currently enabled.
    pub fn any_reminder_channel_enabled(&self) -> bool {
        self.reminder_email_enabled || self.reminder_sms_enabled
    }

    /// Email lead minutes with the data-model default applied.
    pub fn email_lead_minutes(&self) -> i32 {
        self.reminder_email_lead_minutes
            .unwrap_or(DEFAULT_EMAIL_LEAD_MINUTES)
    }

    /// SMS lead minutes with the data-model default applied.
    pub fn sms_lead_minutes(&self) -> i32 {
        self.reminder_sms_lead_minutes
            .unwrap_or(DEFAULT_SMS_LEAD_MINUTES)
    }

    /// Capture the mutable fields for later diffing.
    pub fn snapshot(&self) -> AppointmentSnapshot {
        AppointmentSnapshot {
            start_at: self.start_at,
            end_at: self.end_at,
            doctor_name: self.doctor_name.clone(),
            department: self.department.clone(),
            notes: self.notes.clone(),
            status: self.status,
            reminder_email_enabled: self.reminder_email_enabled,
            reminder_sms_enabled: self.reminder_sms_enabled,
            reminder_email_lead_minutes: self.reminder_email_lead_minutes,
            reminder_sms_lead_minutes: self.reminder_sms_lead_minutes,
            reminder_next_run_at: self.reminder_next_run_at,
        }
    }
}

/// Normalize a caller-supplied doctor name, falling back to the default.
pub fn normalize_doctor_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_owned(),
        _ => DEFAULT_DOCTOR_NAME.to_owned(),
    }
}

/// Creation payload for an appointment.
#[derive(Debug, Clone)]
pub struct AppointmentDraft {
    /// Patient the appointment is for.
    pub patient_id: Uuid,
    /// Doctor name; blank or absent becomes [`DEFAULT_DOCTOR_NAME`].
    pub doctor_name: Option<String>,
    /// Optional department label.
    pub department: Option<String>,
    /// Scheduled start.
    pub start_at: DateTime<Utc>,
    /// Optional explicit end.
    pub end_at: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Initial status; absent means [`AppointmentStatus::Unconfirmed`].
    pub status: Option<AppointmentStatus>,
    /// Email channel toggle.
    pub reminder_email_enabled: Option<bool>,
    /// SMS channel toggle.
    pub reminder_sms_enabled: Option<bool>,
    /// Email lead minutes.
    pub reminder_email_lead_minutes: Option<i32>,
    /// SMS lead minutes.
    pub reminder_sms_lead_minutes: Option<i32>,
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Unconfirmed
    }
}

/// Partial update for an appointment.
///
/// Outer `None` means "leave untouched". For the nullable fields (`end_at`,
/// `department`, `notes`) the inner option distinguishes "set" from "clear".
/// Lead-time fields ignore explicit nulls, matching the data model where the
/// stored value only ever moves between concrete minutes.
#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    /// Replacement doctor name (normalized on merge).
    pub doctor_name: Option<String>,
    /// Replacement or cleared department.
    pub department: Option<Option<String>>,
    /// Replacement start.
    pub start_at: Option<DateTime<Utc>>,
    /// Replacement or cleared end.
    pub end_at: Option<Option<DateTime<Utc>>>,
    /// Replacement or cleared notes.
    pub notes: Option<Option<String>>,
    /// Replacement status.
    pub status: Option<AppointmentStatus>,
    /// Email channel toggle.
    pub reminder_email_enabled: Option<bool>,
    /// SMS channel toggle.
    pub reminder_sms_enabled: Option<bool>,
    /// Email lead minutes.
    pub reminder_email_lead_minutes: Option<i32>,
    /// SMS lead minutes.
    pub reminder_sms_lead_minutes: Option<i32>,
}

impl AppointmentPatch {
    /// Start time the merged appointment will have.
    pub fn merged_start(&self, current: &Appointment) -> DateTime<Utc> {
        self.start_at.unwrap_or(current.start_at)
    }

    /// End time the merged appointment will have.
    pub fn merged_end(&self, current: &Appointment) -> Option<DateTime<Utc>> {
        match &self.end_at {
            Some(value) => *value,
            None => current.end_at,
        }
    }

    /// Status the merged appointment will have.
    pub fn merged_status(&self, current: &Appointment) -> AppointmentStatus {
        self.status.unwrap_or(current.status)
    }

    /// Whether the caller explicitly supplied any reminder setting.
    pub fn touches_reminder_settings(&self) -> bool {
        self.reminder_email_enabled.is_some()
            || self.reminder_sms_enabled.is_some()
            || self.reminder_email_lead_minutes.is_some()
            || self.reminder_sms_lead_minutes.is_some()
    }

    /// Apply every supplied field onto the appointment.
    pub fn merge_into(&self, appointment: &mut Appointment) {
        if let Some(name) = self.doctor_name.as_deref() {
            appointment.doctor_name = normalize_doctor_name(Some(name));
        }
        if let Some(department) = &self.department {
            appointment.department = department.clone();
        }
        if let Some(start) = self.start_at {
            appointment.start_at = start;
        }
        if let Some(end) = &self.end_at {
            appointment.end_at = *end;
        }
        if let Some(notes) = &self.notes {
            appointment.notes = notes.clone();
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(enabled) = self.reminder_email_enabled {
            appointment.reminder_email_enabled = enabled;
        }
        if let Some(enabled) = self.reminder_sms_enabled {
            appointment.reminder_sms_enabled = enabled;
        }
        if let Some(minutes) = self.reminder_email_lead_minutes {
            appointment.reminder_email_lead_minutes = Some(minutes);
        }
        if let Some(minutes) = self.reminder_sms_lead_minutes {
            appointment.reminder_sms_lead_minutes = Some(minutes);
        }
    }
}

/// Pre-mutation copy of an appointment's visible and reminder fields.
///
/// Diffing a snapshot against the mutated aggregate yields the audit metadata
/// and the notification gating decisions in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentSnapshot {
    /// Start before the mutation.
    pub start_at: DateTime<Utc>,
    /// End before the mutation.
    pub end_at: Option<DateTime<Utc>>,
    /// Doctor name before the mutation.
    pub doctor_name: String,
    /// Department before the mutation.
    pub department: Option<String>,
    /// Notes before the mutation.
    pub notes: Option<String>,
    /// Status before the mutation.
    pub status: AppointmentStatus,
    /// Email toggle before the mutation.
    pub reminder_email_enabled: bool,
    /// SMS toggle before the mutation.
    pub reminder_sms_enabled: bool,
    /// Email lead minutes before the mutation.
    pub reminder_email_lead_minutes: Option<i32>,
    /// SMS lead minutes before the mutation.
    pub reminder_sms_lead_minutes: Option<i32>,
    /// Derived next-run before the mutation.
    pub reminder_next_run_at: Option<DateTime<Utc>>,
}

impl AppointmentSnapshot {
    /// Whether any reminder channel was enabled at snapshot time.
    pub fn any_reminder_channel_enabled(&self) -> bool {
        self.reminder_email_enabled || self.reminder_sms_enabled
    }

    /// Whether a patient-visible field differs from the snapshot.
    pub fn has_visible_changes(&self, current: &Appointment) -> bool {
        self.start_at != current.start_at
            || self.end_at != current.end_at
            || self.doctor_name != current.doctor_name
            || self.department != current.department
            || self.notes != current.notes
            || self.status != current.status
    }

    /// Names of reminder *settings* (not the derived next-run) that changed.
    pub fn changed_reminder_settings(&self, current: &Appointment) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.reminder_email_enabled != current.reminder_email_enabled {
            changed.push("reminder_email_enabled");
        }
        if self.reminder_sms_enabled != current.reminder_sms_enabled {
            changed.push("reminder_sms_enabled");
        }
        if self.reminder_email_lead_minutes != current.reminder_email_lead_minutes {
            changed.push("reminder_email_lead_minutes");
        }
        if self.reminder_sms_lead_minutes != current.reminder_sms_lead_minutes {
            changed.push("reminder_sms_lead_minutes");
        }
        changed
    }

    /// Build the `changed_fields` + per-field `{old, new}` audit metadata.
    pub fn diff_metadata(&self, current: &Appointment) -> Value {
        let mut changes = Map::new();
        let mut push = |field: &str, old: Value, new: Value| {
            if old != new {
                changes.insert(field.to_owned(), json!({ "old": old, "new": new }));
            }
        };
        push(
            "start_at",
            json!(self.start_at),
            json!(current.start_at),
        );
        push("end_at", json!(self.end_at), json!(current.end_at));
        push(
            "doctor_name",
            json!(self.doctor_name),
            json!(current.doctor_name),
        );
        push(
            "department",
            json!(self.department),
            json!(current.department),
        );
        push("notes", json!(self.notes), json!(current.notes));
        push("status", json!(self.status), json!(current.status));
        push(
            "reminder_email_enabled",
            json!(self.reminder_email_enabled),
            json!(current.reminder_email_enabled),
        );
        push(
            "reminder_sms_enabled",
            json!(self.reminder_sms_enabled),
            json!(current.reminder_sms_enabled),
        );
        push(
            "reminder_email_lead_minutes",
            json!(self.reminder_email_lead_minutes),
            json!(current.reminder_email_lead_minutes),
        );
        push(
            "reminder_sms_lead_minutes",
            json!(self.reminder_sms_lead_minutes),
            json!(current.reminder_sms_lead_minutes),
        );
        push(
            "reminder_next_run_at",
            json!(self.reminder_next_run_at),
            json!(current.reminder_next_run_at),
        );
        let changed_fields: Vec<&String> = changes.keys().collect();
        json!({
            "changed_fields": changed_fields,
            "changes": changes,
        })
    }
}
