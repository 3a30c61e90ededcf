//! Create medical record command

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditBehavior, AuditableCommand};
use crate::features::patients::model::patient_exists;
use crate::features::shared::validation::validate_length;
use crate::uow::{UnitOfWork, UowError};

use super::super::entity::MedicalRecord;

/// Command to open a new medical record for a patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicalRecordCommand {
    pub patient_id: Uuid,
    pub diagnosis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Acting user, carried into the audit row.
    pub performed_by: Uuid,
}

/// Response from creating a medical record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicalRecordResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur when creating a medical record
#[derive(Debug, thiserror::Error)]
pub enum CreateMedicalRecordError {
    /// Diagnosis was empty or exceeds 512 characters
    #[error("Diagnosis is required and must be at most 512 characters")]
    DiagnosisInvalid,
    /// No patient with the given id exists
    #[error("Patient {0} not found")]
    PatientNotFound(Uuid),
    /// Unit-of-work or transaction failure
    #[error(transparent)]
    Uow(#[from] UowError),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CreateMedicalRecordResponse, CreateMedicalRecordError>>
    for CreateMedicalRecordCommand
{
}

impl AuditableCommand for CreateMedicalRecordCommand {
    fn performed_by(&self) -> Uuid {
        self.performed_by
    }

    fn audit_action(&self) -> AuditAction {
        AuditAction::Create
    }
}

impl CreateMedicalRecordCommand {
    pub fn validate(&self) -> Result<(), CreateMedicalRecordError> {
        if !validate_length(&self.diagnosis, 512) {
            return Err(CreateMedicalRecordError::DiagnosisInvalid);
        }
        Ok(())
    }
}

/// Handles the create medical record command
///
/// Registers the new record with a fresh unit of work and runs the insert
/// under the audit behavior, so the row and its `create` audit entry commit
/// together.
#[tracing::instrument(skip(pool, command), fields(patient_id = %command.patient_id))]
pub async fn handle(
    pool: PgPool,
    command: CreateMedicalRecordCommand,
) -> Result<CreateMedicalRecordResponse, CreateMedicalRecordError> {
    command.validate()?;

    if !patient_exists(&pool, command.patient_id).await? {
        return Err(CreateMedicalRecordError::PatientNotFound(command.patient_id));
    }

    let record = MedicalRecord::new(
        command.patient_id,
        command.diagnosis.trim().to_string(),
        command.notes.clone(),
    );

    let mut uow = UnitOfWork::new(pool);
    let behavior = AuditBehavior::medical_records();
    behavior
        .execute(&mut uow, &command, |uow| {
            let record = record.clone();
            Box::pin(async move {
                uow.track_added(record)?;
                Ok::<_, CreateMedicalRecordError>(())
            })
        })
        .await?;

    tracing::info!(record_id = %record.id, "Medical record created");

    Ok(CreateMedicalRecordResponse {
        id: record.id,
        patient_id: record.patient_id,
        diagnosis: record.diagnosis,
        notes: record.notes,
        status: record.status,
        version: record.version,
        created_at: record.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestPatient;

    fn command(patient_id: Uuid) -> CreateMedicalRecordCommand {
        CreateMedicalRecordCommand {
            patient_id,
            diagnosis: "Influenza A".to_string(),
            notes: Some("High fever on admission".to_string()),
            performed_by: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_validation_rejects_empty_diagnosis() {
        let mut cmd = command(Uuid::new_v4());
        cmd.diagnosis = "   ".to_string();
        assert!(matches!(
            cmd.validate(),
            Err(CreateMedicalRecordError::DiagnosisInvalid)
        ));
    }

    #[test]
    fn test_validation_rejects_oversized_diagnosis() {
        let mut cmd = command(Uuid::new_v4());
        cmd.diagnosis = "x".repeat(513);
        assert!(cmd.validate().is_err());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_creates_record_and_audit_row(pool: PgPool) -> sqlx::Result<()> {
        let patient = TestPatient::new("MRN-1001").insert(&pool).await?;

        let response = handle(pool.clone(), command(patient.id)).await.unwrap();
        assert_eq!(response.version, 1);
        assert_eq!(response.status, "open");

        let (action, entity_id): (String, Option<Uuid>) = sqlx::query_as(
            "SELECT action, entity_id FROM audit_log WHERE entity_kind = 'medical_record'",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(action, "create");
        assert_eq!(entity_id, Some(response.id));
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_unknown_patient(pool: PgPool) -> sqlx::Result<()> {
        let result = handle(pool.clone(), command(Uuid::new_v4())).await;
        assert!(matches!(
            result,
            Err(CreateMedicalRecordError::PatientNotFound(_))
        ));
        Ok(())
    }
}
