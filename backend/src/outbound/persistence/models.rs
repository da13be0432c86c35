//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{appointments, audit_logs, patients};

/// Row struct for reading from the patients table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = patients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PatientRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub medications: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the appointments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AppointmentRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_name: String,
    pub department: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub status: String,
    pub reminder_email_enabled: bool,
    pub reminder_sms_enabled: bool,
    pub reminder_email_lead_minutes: Option<i32>,
    pub reminder_sms_lead_minutes: Option<i32>,
    pub reminder_next_run_at: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new appointment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = appointments)]
pub(crate) struct NewAppointmentRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_name: &'a str,
    pub department: Option<&'a str>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub notes: Option<&'a str>,
    pub status: &'a str,
    pub reminder_email_enabled: bool,
    pub reminder_sms_enabled: bool,
    pub reminder_email_lead_minutes: Option<i32>,
    pub reminder_sms_lead_minutes: Option<i32>,
    pub reminder_next_run_at: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Changeset struct for updating existing appointment records.
///
/// Every field is written on each update; the domain service owns partial
/// merge semantics, so by the time a row reaches this layer it is complete.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = appointments)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AppointmentChangeset<'a> {
    pub patient_id: Uuid,
    pub doctor_name: &'a str,
    pub department: Option<&'a str>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub notes: Option<&'a str>,
    pub status: &'a str,
    pub reminder_email_enabled: bool,
    pub reminder_sms_enabled: bool,
    pub reminder_email_lead_minutes: Option<i32>,
    pub reminder_sms_lead_minutes: Option<i32>,
    pub reminder_next_run_at: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
}

/// Insertable struct for appending audit log records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_logs)]
pub(crate) struct NewAuditLogRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<Uuid>,
    pub summary: &'a str,
    pub metadata: Option<&'a serde_json::Value>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub request_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}
