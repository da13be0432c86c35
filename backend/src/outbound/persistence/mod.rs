//! Persistence adapters.
//!
//! PostgreSQL implementations of the repository and audit ports via Diesel
//! (`diesel-async` + `bb8` pooling), plus an in-memory adapter set used by
//! tests and the no-database development mode.
//!
//! The adapters are deliberately thin: they translate between internal row
//! structs ([`mod@self`]::models, never exposed to the domain) and domain
//! aggregates, and map database failures to the port error types. No
//! scheduling logic lives on this side of the hexagon.

mod diesel_appointment_repository;
mod diesel_audit_sink;
mod diesel_patient_repository;
mod memory;
mod models;
mod pool;
mod schema;

pub use diesel_appointment_repository::DieselAppointmentRepository;
pub use diesel_audit_sink::DieselAuditSink;
pub use diesel_patient_repository::DieselPatientRepository;
pub use memory::{InMemoryAppointmentRepository, InMemoryAuditSink, InMemoryPatientRepository};
pub use pool::{DbPool, PoolConfig, PoolError};
