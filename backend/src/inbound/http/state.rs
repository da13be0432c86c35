//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the domain services and remain testable without real I/O.

use std::sync::Arc;

use crate::domain::ports::AuditSink;
use crate::domain::{AppointmentService, ReminderDispatcher};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Appointment lifecycle service.
    pub appointments: Arc<AppointmentService>,
    /// Reminder sweep, exposed for the operator-triggered run.
    pub dispatcher: Arc<ReminderDispatcher>,
    /// Audit sink for endpoint-level events (e.g. manual sweep runs).
    pub audit: Arc<dyn AuditSink>,
}

impl HttpState {
    /// Bundle the services handlers need.
    pub fn new(
        appointments: Arc<AppointmentService>,
        dispatcher: Arc<ReminderDispatcher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            appointments,
            dispatcher,
            audit,
        }
    }
}
