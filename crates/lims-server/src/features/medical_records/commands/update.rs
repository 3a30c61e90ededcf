//! Update medical record command
//!
//! Partially updates an existing record. Only provided fields change. The
//! staged copy bumps the version token; a concurrent writer makes the flush
//! fail with a conflict and nothing is persisted.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditBehavior, AuditableCommand};
use crate::features::shared::validation::{validate_length, validate_one_of};
use crate::uow::{UnitOfWork, UowError};

use super::super::entity::{find_medical_record, RECORD_STATUSES};

/// Command to update an existing medical record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMedicalRecordCommand {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub performed_by: Uuid,
}

/// Response from updating a medical record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMedicalRecordResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: String,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur when updating a medical record
#[derive(Debug, thiserror::Error)]
pub enum UpdateMedicalRecordError {
    /// No fields were provided for update
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    /// Diagnosis was empty or exceeds 512 characters
    #[error("Diagnosis must be non-empty and at most 512 characters")]
    DiagnosisInvalid,
    /// Status is not one of the allowed values
    #[error("Status must be one of: open, closed, amended")]
    StatusInvalid,
    /// No record with the given id exists
    #[error("Medical record {0} not found")]
    NotFound(Uuid),
    /// Unit-of-work or transaction failure, including version conflicts
    #[error(transparent)]
    Uow(#[from] UowError),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<UpdateMedicalRecordResponse, UpdateMedicalRecordError>>
    for UpdateMedicalRecordCommand
{
}

impl AuditableCommand for UpdateMedicalRecordCommand {
    fn performed_by(&self) -> Uuid {
        self.performed_by
    }

    fn audit_action(&self) -> AuditAction {
        AuditAction::Update
    }

    fn target_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

impl UpdateMedicalRecordCommand {
    pub fn validate(&self) -> Result<(), UpdateMedicalRecordError> {
        if self.diagnosis.is_none() && self.notes.is_none() && self.status.is_none() {
            return Err(UpdateMedicalRecordError::NoFieldsToUpdate);
        }
        if let Some(ref diagnosis) = self.diagnosis {
            if !validate_length(diagnosis, 512) {
                return Err(UpdateMedicalRecordError::DiagnosisInvalid);
            }
        }
        if let Some(ref status) = self.status {
            if !validate_one_of(status, RECORD_STATUSES) {
                return Err(UpdateMedicalRecordError::StatusInvalid);
            }
        }
        Ok(())
    }
}

/// Handles the update medical record command
///
/// Loads and tracks the persisted row, stages the mutated copy inside the
/// audit behavior, and lets the behavior diff and commit. Staging the same
/// values produces no audit row and no UPDATE.
#[tracing::instrument(skip(pool, command), fields(record_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: UpdateMedicalRecordCommand,
) -> Result<UpdateMedicalRecordResponse, UpdateMedicalRecordError> {
    command.validate()?;

    let record = find_medical_record(&pool, command.id)
        .await?
        .ok_or(UpdateMedicalRecordError::NotFound(command.id))?;

    let mut uow = UnitOfWork::new(pool);
    let key = uow.track_loaded(record.clone())?;

    let mut updated = record;
    if let Some(ref diagnosis) = command.diagnosis {
        updated.diagnosis = diagnosis.trim().to_string();
    }
    if let Some(ref notes) = command.notes {
        updated.notes = Some(notes.clone());
    }
    if let Some(ref status) = command.status {
        updated.status = status.clone();
    }
    updated.version += 1;
    updated.updated_at = Utc::now();

    let behavior = AuditBehavior::medical_records();
    behavior
        .execute(&mut uow, &command, |uow| {
            let updated = updated.clone();
            Box::pin(async move {
                uow.stage(key, updated)?;
                Ok::<_, UpdateMedicalRecordError>(())
            })
        })
        .await?;

    tracing::info!(record_id = %updated.id, version = updated.version, "Medical record updated");

    Ok(UpdateMedicalRecordResponse {
        id: updated.id,
        patient_id: updated.patient_id,
        diagnosis: updated.diagnosis,
        notes: updated.notes,
        status: updated.status,
        version: updated.version,
        updated_at: updated.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{TestMedicalRecord, TestPatient};

    #[test]
    fn test_validation_requires_a_field() {
        let cmd = UpdateMedicalRecordCommand {
            id: Uuid::new_v4(),
            diagnosis: None,
            notes: None,
            status: None,
            performed_by: Uuid::new_v4(),
        };
        assert!(matches!(
            cmd.validate(),
            Err(UpdateMedicalRecordError::NoFieldsToUpdate)
        ));
    }

    #[test]
    fn test_validation_rejects_unknown_status() {
        let cmd = UpdateMedicalRecordCommand {
            id: Uuid::new_v4(),
            diagnosis: None,
            notes: None,
            status: Some("archived".to_string()),
            performed_by: Uuid::new_v4(),
        };
        assert!(matches!(
            cmd.validate(),
            Err(UpdateMedicalRecordError::StatusInvalid)
        ));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_bumps_version(pool: PgPool) -> sqlx::Result<()> {
        let patient = TestPatient::new("MRN-2001").insert(&pool).await?;
        let record = TestMedicalRecord::new(patient.id, "Influenza A")
            .insert(&pool)
            .await?;

        let cmd = UpdateMedicalRecordCommand {
            id: record.id,
            diagnosis: Some("Influenza B".to_string()),
            notes: None,
            status: None,
            performed_by: Uuid::new_v4(),
        };
        let response = handle(pool.clone(), cmd).await.unwrap();
        assert_eq!(response.version, 2);
        assert_eq!(response.diagnosis, "Influenza B");

        let stored: i32 =
            sqlx::query_scalar("SELECT version FROM medical_records WHERE id = $1")
                .bind(record.id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(stored, 2);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_stale_copy_conflicts_and_rolls_back(pool: PgPool) -> sqlx::Result<()> {
        let patient = TestPatient::new("MRN-2002").insert(&pool).await?;
        let record = TestMedicalRecord::new(patient.id, "Influenza A")
            .with_version(3)
            .insert(&pool)
            .await?;

        // Load a copy, then let a concurrent writer move the row forward.
        let stale = find_medical_record(&pool, record.id).await?.unwrap();
        sqlx::query("UPDATE medical_records SET version = 5 WHERE id = $1")
            .bind(record.id)
            .execute(&pool)
            .await?;

        let cmd = UpdateMedicalRecordCommand {
            id: record.id,
            diagnosis: Some("Influenza B".to_string()),
            notes: None,
            status: None,
            performed_by: Uuid::new_v4(),
        };

        let mut uow = UnitOfWork::new(pool.clone());
        let key = uow.track_loaded(stale.clone()).unwrap();
        let mut updated = stale;
        updated.diagnosis = "Influenza B".to_string();
        updated.version += 1;

        let behavior = AuditBehavior::medical_records();
        let result: Result<(), UpdateMedicalRecordError> = behavior
            .execute(&mut uow, &cmd, |uow| {
                let updated = updated.clone();
                Box::pin(async move {
                    uow.stage(key, updated)?;
                    Ok(())
                })
            })
            .await;

        assert!(matches!(
            result,
            Err(UpdateMedicalRecordError::Uow(UowError::Conflict { .. }))
        ));

        // The conflicting write rolled back: no audit row, row untouched.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0);
        let stored: i32 =
            sqlx::query_scalar("SELECT version FROM medical_records WHERE id = $1")
                .bind(record.id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(stored, 5);
        Ok(())
    }
}
