//! PostgreSQL-backed `PatientRepository` implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::Patient;
use crate::domain::ports::{PatientRepository, PatientRepositoryError};

use super::models::PatientRow;
use super::pool::{DbPool, PoolError};
use super::schema::patients;

/// Diesel-backed implementation of the `PatientRepository` port.
#[derive(Clone)]
pub struct DieselPatientRepository {
    pool: DbPool,
}

impl DieselPatientRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PatientRepositoryError {
    PatientRepositoryError::connection(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error) -> PatientRepositoryError {
    PatientRepositoryError::query(error.to_string())
}

fn row_to_patient(row: PatientRow) -> Patient {
    Patient {
        id: row.id,
        owner_id: row.owner_id,
        full_name: row.full_name,
        date_of_birth: row.date_of_birth,
        phone: row.phone,
        email: row.email,
        medical_history: row.medical_history,
        medications: row.medications,
        notes: row.notes,
        created_at: row.created_at,
    }
}

#[async_trait]
impl PatientRepository for DieselPatientRepository {
    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Patient>, PatientRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = patients::table
            .filter(patients::id.eq(id).and(patients::owner_id.eq(owner_id)))
            .select(PatientRow::as_select())
            .first::<PatientRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_patient))
    }
}
