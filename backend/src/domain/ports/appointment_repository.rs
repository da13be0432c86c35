//! Port abstraction for appointment persistence adapters and their errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Appointment;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by appointment repository adapters.
    pub enum AppointmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "appointment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "appointment repository query failed: {message}",
    }
}

/// Port for appointment storage and retrieval.
///
/// Every lookup and mutation is owner-scoped: an id that exists under a
/// different owner behaves exactly like an id that does not exist at all.
/// Single-row writes (`insert`, `update`, `delete`) must be atomic at the row
/// level; cross-aggregate transactions are not part of the contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Fetch one appointment by id within the owner's tenant.
    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentRepositoryError>;

    /// All appointments for one owner, newest first.
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError>;

    /// The owner's appointments in a schedulable status, optionally excluding
    /// one id (so updates do not conflict with themselves).
    async fn list_active(
        &self,
        owner_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError>;

    /// Appointments across all owners that could still need a reminder:
    /// confirmed status, unsent (`reminder_sent_at IS NULL`), starting within
    /// `[window_start, window_end]`.
    async fn list_reminder_candidates(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError>;

    /// Insert a new appointment record.
    async fn insert(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError>;

    /// Persist changes to an existing appointment record.
    async fn update(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError>;

    /// Hard-delete one appointment within the owner's tenant; returns whether
    /// a row was removed.
    async fn delete(&self, id: Uuid, owner_id: Uuid)
    -> Result<bool, AppointmentRepositoryError>;
}
