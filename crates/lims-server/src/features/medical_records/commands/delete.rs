//! Delete medical record command

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditBehavior, AuditableCommand};
use crate::uow::{UnitOfWork, UowError};

use super::super::entity::find_medical_record;

/// Command to delete a medical record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMedicalRecordCommand {
    pub id: Uuid,
    pub performed_by: Uuid,
}

/// Response from deleting a medical record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMedicalRecordResponse {
    pub id: Uuid,
}

/// Errors that can occur when deleting a medical record
#[derive(Debug, thiserror::Error)]
pub enum DeleteMedicalRecordError {
    /// No record with the given id exists
    #[error("Medical record {0} not found")]
    NotFound(Uuid),
    /// Unit-of-work or transaction failure
    #[error(transparent)]
    Uow(#[from] UowError),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DeleteMedicalRecordResponse, DeleteMedicalRecordError>>
    for DeleteMedicalRecordCommand
{
}

impl AuditableCommand for DeleteMedicalRecordCommand {
    fn performed_by(&self) -> Uuid {
        self.performed_by
    }

    fn audit_action(&self) -> AuditAction {
        AuditAction::Delete
    }

    fn target_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

/// Handles the delete medical record command
///
/// The audit row for a delete keeps the full final field values, so the
/// record's last state survives in the trail after the row is gone.
#[tracing::instrument(skip(pool, command), fields(record_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: DeleteMedicalRecordCommand,
) -> Result<DeleteMedicalRecordResponse, DeleteMedicalRecordError> {
    let record = find_medical_record(&pool, command.id)
        .await?
        .ok_or(DeleteMedicalRecordError::NotFound(command.id))?;
    let record_id = record.id;

    let mut uow = UnitOfWork::new(pool);
    let key = uow.track_loaded(record)?;

    let behavior = AuditBehavior::medical_records();
    behavior
        .execute(&mut uow, &command, |uow| {
            Box::pin(async move {
                uow.mark_deleted(key)?;
                Ok::<_, DeleteMedicalRecordError>(())
            })
        })
        .await?;

    tracing::info!(record_id = %record_id, "Medical record deleted");

    Ok(DeleteMedicalRecordResponse { id: record_id })
}
