//! Port abstraction for patient lookups needed by the scheduling core.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Patient;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by patient repository adapters.
    pub enum PatientRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "patient repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "patient repository query failed: {message}",
    }
}

/// Port for patient retrieval, owner-scoped like every other lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Fetch one patient by id within the owner's tenant.
    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Patient>, PatientRepositoryError>;
}
