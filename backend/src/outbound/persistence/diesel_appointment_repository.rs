//! PostgreSQL-backed `AppointmentRepository` implementation using Diesel.
//!
//! A thin adapter: translates between Diesel rows and the domain aggregate
//! and maps database failures to port errors. No scheduling logic lives here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::Appointment;
use crate::domain::AppointmentStatus;
use crate::domain::ports::{AppointmentRepository, AppointmentRepositoryError};

use super::models::{AppointmentChangeset, AppointmentRow, NewAppointmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::appointments;

const SCHEDULABLE_STATUSES: [&str; 3] = ["Unconfirmed", "Confirmed", "Scheduled"];

/// Diesel-backed implementation of the `AppointmentRepository` port.
#[derive(Clone)]
pub struct DieselAppointmentRepository {
    pool: DbPool,
}

impl DieselAppointmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AppointmentRepositoryError {
    AppointmentRepositoryError::connection(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error) -> AppointmentRepositoryError {
    AppointmentRepositoryError::query(error.to_string())
}

fn row_to_appointment(row: AppointmentRow) -> Result<Appointment, AppointmentRepositoryError> {
    let status: AppointmentStatus = row
        .status
        .parse()
        .map_err(|err: crate::domain::appointment::ParseStatusError| {
            AppointmentRepositoryError::query(err.to_string())
        })?;
    Ok(Appointment {
        id: row.id,
        owner_id: row.owner_id,
        patient_id: row.patient_id,
        doctor_name: row.doctor_name,
        department: row.department,
        start_at: row.start_at,
        end_at: row.end_at,
        notes: row.notes,
        status,
        reminder_email_enabled: row.reminder_email_enabled,
        reminder_sms_enabled: row.reminder_sms_enabled,
        reminder_email_lead_minutes: row.reminder_email_lead_minutes,
        reminder_sms_lead_minutes: row.reminder_sms_lead_minutes,
        reminder_next_run_at: row.reminder_next_run_at,
        reminder_sent_at: row.reminder_sent_at,
        created_at: row.created_at,
    })
}

fn rows_to_appointments(
    rows: Vec<AppointmentRow>,
) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
    rows.into_iter().map(row_to_appointment).collect()
}

fn new_row(appointment: &Appointment) -> NewAppointmentRow<'_> {
    NewAppointmentRow {
        id: appointment.id,
        owner_id: appointment.owner_id,
        patient_id: appointment.patient_id,
        doctor_name: &appointment.doctor_name,
        department: appointment.department.as_deref(),
        start_at: appointment.start_at,
        end_at: appointment.end_at,
        notes: appointment.notes.as_deref(),
        status: appointment.status.as_str(),
        reminder_email_enabled: appointment.reminder_email_enabled,
        reminder_sms_enabled: appointment.reminder_sms_enabled,
        reminder_email_lead_minutes: appointment.reminder_email_lead_minutes,
        reminder_sms_lead_minutes: appointment.reminder_sms_lead_minutes,
        reminder_next_run_at: appointment.reminder_next_run_at,
        reminder_sent_at: appointment.reminder_sent_at,
        created_at: appointment.created_at,
    }
}

fn changeset(appointment: &Appointment) -> AppointmentChangeset<'_> {
    AppointmentChangeset {
        patient_id: appointment.patient_id,
        doctor_name: &appointment.doctor_name,
        department: appointment.department.as_deref(),
        start_at: appointment.start_at,
        end_at: appointment.end_at,
        notes: appointment.notes.as_deref(),
        status: appointment.status.as_str(),
        reminder_email_enabled: appointment.reminder_email_enabled,
        reminder_sms_enabled: appointment.reminder_sms_enabled,
        reminder_email_lead_minutes: appointment.reminder_email_lead_minutes,
        reminder_sms_lead_minutes: appointment.reminder_sms_lead_minutes,
        reminder_next_run_at: appointment.reminder_next_run_at,
        reminder_sent_at: appointment.reminder_sent_at,
    }
}

#[async_trait]
impl AppointmentRepository for DieselAppointmentRepository {
    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = appointments::table
            .filter(
                appointments::id
                    .eq(id)
                    .and(appointments::owner_id.eq(owner_id)),
            )
            .select(AppointmentRow::as_select())
            .first::<AppointmentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_appointment).transpose()
    }

    async fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = appointments::table
            .filter(appointments::owner_id.eq(owner_id))
            .order(appointments::created_at.desc())
            .select(AppointmentRow::as_select())
            .load::<AppointmentRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_appointments(rows)
    }

    async fn list_active(
        &self,
        owner_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = appointments::table
            .select(AppointmentRow::as_select())
            .filter(
                appointments::owner_id
                    .eq(owner_id)
                    .and(appointments::status.eq_any(SCHEDULABLE_STATUSES)),
            )
            .into_boxed();
        if let Some(excluded) = exclude_id {
            query = query.filter(appointments::id.ne(excluded));
        }
        let rows = query
            .load::<AppointmentRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_appointments(rows)
    }

    async fn list_reminder_candidates(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = appointments::table
            .filter(
                appointments::status
                    .eq(AppointmentStatus::Confirmed.as_str())
                    .and(appointments::reminder_sent_at.is_null())
                    .and(appointments::start_at.ge(window_start))
                    .and(appointments::start_at.le(window_end)),
            )
            .select(AppointmentRow::as_select())
            .load::<AppointmentRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_appointments(rows)
    }

    async fn insert(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(appointments::table)
            .values(new_row(appointment))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            appointments::table.filter(
                appointments::id
                    .eq(appointment.id)
                    .and(appointments::owner_id.eq(appointment.owner_id)),
            ),
        )
        .set(changeset(appointment))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn delete(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            appointments::table.filter(
                appointments::id
                    .eq(id)
                    .and(appointments::owner_id.eq(owner_id)),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
