//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the scheduling core expects to interact with driven
//! adapters (the database, the mail relay, the audit store). Each trait
//! exposes strongly typed errors so adapters map their failures into
//! predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod appointment_repository;
mod audit_sink;
mod notifier;
mod patient_repository;

#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
pub use appointment_repository::{AppointmentRepository, AppointmentRepositoryError};
#[cfg(test)]
pub use audit_sink::MockAuditSink;
pub use audit_sink::{AuditSink, NullAuditSink};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notifier, NotifierError};
#[cfg(test)]
pub use patient_repository::MockPatientRepository;
pub use patient_repository::{PatientRepository, PatientRepositoryError};
