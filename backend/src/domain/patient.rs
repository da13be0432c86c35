//! Patient entity.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A patient record, owned by exactly one admin tenant.
///
/// The appointment aggregate references patients by id only; traversal in the
/// other direction ("a patient's appointments") is a repository query, never
/// a held reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    /// Identifier, unique within the owner's tenant.
    pub id: Uuid,
    /// Admin tenant that owns this record.
    pub owner_id: Uuid,
    /// Display name.
    pub full_name: String,
    /// Optional date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional email address; reminders require a usable value.
    pub email: Option<String>,
    /// Free-text medical history.
    pub medical_history: Option<String>,
    /// Free-text current medications.
    pub medications: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// The patient's email address trimmed of whitespace, or `None` when
    /// blank or absent. Notification paths must treat `None` as "no usable
    /// recipient".
    pub fn contact_email(&self) -> Option<&str> {
        let email = self.email.as_deref()?.trim();
        if email.is_empty() { None } else { Some(email) }
    }
}
