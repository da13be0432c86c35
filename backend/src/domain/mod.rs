//! Domain entities, scheduling core, and ports.
//!
//! Purpose: define the strongly typed aggregates the API and persistence
//! layers share, plus the scheduling state machine that owns every invariant
//! around time ranges, double booking, and reminder derivation. Transport
//! and storage concerns live in the inbound/outbound adapters.

pub mod appointment;
pub mod audit;
pub mod error;
pub mod notifications;
pub mod patient;
pub mod ports;
pub mod scheduling;

pub use self::appointment::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentSnapshot, AppointmentStatus,
};
pub use self::audit::{AuditEvent, RequestContext};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::patient::Patient;
pub use self::scheduling::{
    AppointmentService, DispatcherHandle, ReminderDispatcher, ReminderSimulation,
    ReminderSweepSettings, SchedulingSettings, SweepSummary,
};

/// Convenient domain result alias.
pub type ApiResult<T> = Result<T, Error>;
