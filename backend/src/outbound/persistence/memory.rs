//! In-memory adapter set.
//!
//! Backs the test suite and the no-database development mode. Rows live in
//! plain mutex-guarded maps; the adapters honour the same owner-scoping and
//! filtering contracts as the PostgreSQL implementations.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::appointment::Appointment;
use crate::domain::audit::AuditEvent;
use crate::domain::patient::Patient;
use crate::domain::ports::{
    AppointmentRepository, AppointmentRepositoryError, AuditSink, PatientRepository,
    PatientRepositoryError,
};
use crate::domain::AppointmentStatus;

/// Appointment storage over a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentRepository {
    rows: Mutex<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing the port (test seeding).
    pub fn seed(&self, appointment: Appointment) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(appointment.id, appointment);
    }

    /// Snapshot of one row (test inspection).
    pub fn get(&self, id: Uuid) -> Option<Appointment> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentRepositoryError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .get(&id)
            .filter(|appointment| appointment.owner_id == owner_id)
            .cloned())
    }

    async fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<Appointment> = rows
            .values()
            .filter(|appointment| appointment.owner_id == owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list_active(
        &self,
        owner_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .values()
            .filter(|appointment| {
                appointment.owner_id == owner_id
                    && appointment.status.is_schedulable()
                    && Some(appointment.id) != exclude_id
            })
            .cloned()
            .collect())
    }

    async fn list_reminder_candidates(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .values()
            .filter(|appointment| {
                appointment.status == AppointmentStatus::Confirmed
                    && appointment.reminder_sent_at.is_none()
                    && appointment.start_at >= window_start
                    && appointment.start_at <= window_end
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn update(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn delete(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, AppointmentRepositoryError> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let matches = rows
            .get(&id)
            .is_some_and(|appointment| appointment.owner_id == owner_id);
        if matches {
            rows.remove(&id);
        }
        Ok(matches)
    }
}

/// Patient storage over a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryPatientRepository {
    rows: Mutex<HashMap<Uuid, Patient>>,
}

impl InMemoryPatientRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly (test seeding).
    pub fn seed(&self, patient: Patient) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(patient.id, patient);
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Patient>, PatientRepositoryError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .get(&id)
            .filter(|patient| patient.owner_id == owner_id)
            .cloned())
    }
}

/// Audit sink that appends to a vector.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events (test inspection).
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
