//! Get patient query

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::super::model::{find_patient, Patient};

/// Query to fetch a single patient by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPatientQuery {
    pub id: Uuid,
}

pub type GetPatientResponse = Patient;

/// Errors that can occur when fetching a patient
#[derive(Debug, thiserror::Error)]
pub enum GetPatientError {
    #[error("Patient {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<GetPatientResponse, GetPatientError>> for GetPatientQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: GetPatientQuery,
) -> Result<GetPatientResponse, GetPatientError> {
    find_patient(&pool, query.id)
        .await?
        .ok_or(GetPatientError::NotFound(query.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestPatient;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_returns_patient(pool: PgPool) -> sqlx::Result<()> {
        let patient = TestPatient::new("MRN-0200")
            .with_name("Grace", "Hopper")
            .insert(&pool)
            .await?;

        let response = handle(pool.clone(), GetPatientQuery { id: patient.id })
            .await
            .unwrap();
        assert_eq!(response.first_name, "Grace");
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_missing_patient(pool: PgPool) -> sqlx::Result<()> {
        let result = handle(pool.clone(), GetPatientQuery { id: Uuid::new_v4() }).await;
        assert!(matches!(result, Err(GetPatientError::NotFound(_))));
        Ok(())
    }
}
