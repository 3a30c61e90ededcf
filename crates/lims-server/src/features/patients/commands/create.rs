//! Register patient command
//!
//! Patient registration is not audited; only medical records and test
//! orders are watched entity types.

use chrono::NaiveDate;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::validation::validate_length;

/// Command to register a new patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientCommand {
    /// Medical record number; unique per patient.
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

/// Response from registering a patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientResponse {
    pub id: Uuid,
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

/// Errors that can occur when registering a patient
#[derive(Debug, thiserror::Error)]
pub enum CreatePatientError {
    /// MRN was empty or exceeds 64 characters
    #[error("MRN is required and must be at most 64 characters")]
    MrnInvalid,
    /// First or last name was empty or exceeds 128 characters
    #[error("First and last name are required, at most 128 characters each")]
    NameInvalid,
    /// A patient with this MRN already exists
    #[error("Patient with MRN '{0}' already exists")]
    DuplicateMrn(String),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CreatePatientResponse, CreatePatientError>> for CreatePatientCommand {}

impl CreatePatientCommand {
    pub fn validate(&self) -> Result<(), CreatePatientError> {
        if !validate_length(&self.mrn, 64) {
            return Err(CreatePatientError::MrnInvalid);
        }
        if !validate_length(&self.first_name, 128) || !validate_length(&self.last_name, 128) {
            return Err(CreatePatientError::NameInvalid);
        }
        Ok(())
    }
}

/// Handles the create patient command
#[tracing::instrument(skip(pool, command), fields(mrn = %command.mrn))]
pub async fn handle(
    pool: PgPool,
    command: CreatePatientCommand,
) -> Result<CreatePatientResponse, CreatePatientError> {
    command.validate()?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM patients WHERE mrn = $1)")
        .bind(&command.mrn)
        .fetch_one(&pool)
        .await?;
    if exists {
        return Err(CreatePatientError::DuplicateMrn(command.mrn));
    }

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO patients (id, mrn, first_name, last_name, date_of_birth)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(&command.mrn)
    .bind(&command.first_name)
    .bind(&command.last_name)
    .bind(command.date_of_birth)
    .execute(&pool)
    .await?;

    tracing::info!(patient_id = %id, "Patient registered");

    Ok(CreatePatientResponse {
        id,
        mrn: command.mrn,
        first_name: command.first_name,
        last_name: command.last_name,
        date_of_birth: command.date_of_birth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> CreatePatientCommand {
        CreatePatientCommand {
            mrn: "MRN-0100".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
        }
    }

    #[test]
    fn test_validation_rejects_blank_mrn() {
        let mut cmd = command();
        cmd.mrn = " ".to_string();
        assert!(matches!(cmd.validate(), Err(CreatePatientError::MrnInvalid)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_registers_patient(pool: PgPool) -> sqlx::Result<()> {
        let response = handle(pool.clone(), command()).await.unwrap();
        assert_eq!(response.mrn, "MRN-0100");

        // Patient registration writes no audit rows.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_duplicate_mrn(pool: PgPool) -> sqlx::Result<()> {
        handle(pool.clone(), command()).await.unwrap();
        let result = handle(pool.clone(), command()).await;
        assert!(matches!(result, Err(CreatePatientError::DuplicateMrn(_))));
        Ok(())
    }
}
