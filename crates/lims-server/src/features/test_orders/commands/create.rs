//! Create test order command

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditBehavior, AuditableCommand};
use crate::features::patients::model::patient_exists;
use crate::features::shared::validation::{validate_length, validate_one_of};
use crate::uow::{UnitOfWork, UowError};

use super::super::entity::{TestOrder, ORDER_PRIORITIES};

/// Command to place a new lab test order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTestOrderCommand {
    pub patient_id: Uuid,
    pub test_type: String,
    /// Defaults to `routine` when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Acting user; also recorded as the ordering user.
    pub performed_by: Uuid,
}

/// Response from placing a test order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTestOrderResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub ordered_by: Uuid,
    pub test_type: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur when placing a test order
#[derive(Debug, thiserror::Error)]
pub enum CreateTestOrderError {
    /// Test type was empty or exceeds 128 characters
    #[error("Test type is required and must be at most 128 characters")]
    TestTypeInvalid,
    /// Priority is not one of the allowed values
    #[error("Priority must be one of: stat, urgent, routine")]
    PriorityInvalid,
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

impl Request<Result<CreateTestOrderResponse, CreateTestOrderError>> for CreateTestOrderCommand {}

impl AuditableCommand for CreateTestOrderCommand {
    fn performed_by(&self) -> Uuid {
        self.performed_by
    }

    fn audit_action(&self) -> AuditAction {
        AuditAction::Create
    }
}

impl CreateTestOrderCommand {
    pub fn validate(&self) -> Result<(), CreateTestOrderError> {
        if !validate_length(&self.test_type, 128) {
            return Err(CreateTestOrderError::TestTypeInvalid);
        }
        if let Some(ref priority) = self.priority {
            if !validate_one_of(priority, ORDER_PRIORITIES) {
                return Err(CreateTestOrderError::PriorityInvalid);
            }
        }
        Ok(())
    }
}

/// Handles the create test order command
#[tracing::instrument(skip(pool, command), fields(patient_id = %command.patient_id, test_type = %command.test_type))]
pub async fn handle(
    pool: PgPool,
    command: CreateTestOrderCommand,
) -> Result<CreateTestOrderResponse, CreateTestOrderError> {
    command.validate()?;

    if !patient_exists(&pool, command.patient_id).await? {
        return Err(CreateTestOrderError::PatientNotFound(command.patient_id));
    }

    let order = TestOrder::new(
        command.patient_id,
        command.performed_by,
        command.test_type.trim().to_string(),
        command
            .priority
            .clone()
            .unwrap_or_else(|| "routine".to_string()),
    );

    let mut uow = UnitOfWork::new(pool);
    let behavior = AuditBehavior::test_orders();
    behavior
        .execute(&mut uow, &command, |uow| {
            let order = order.clone();
            Box::pin(async move {
                uow.track_added(order)?;
                Ok::<_, CreateTestOrderError>(())
            })
        })
        .await?;

    tracing::info!(order_id = %order.id, "Test order placed");

    Ok(CreateTestOrderResponse {
        id: order.id,
        patient_id: order.patient_id,
        ordered_by: order.ordered_by,
        test_type: order.test_type,
        priority: order.priority,
        status: order.status,
        created_at: order.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestPatient;

    fn command(patient_id: Uuid) -> CreateTestOrderCommand {
        CreateTestOrderCommand {
            patient_id,
            test_type: "CBC".to_string(),
            priority: Some("urgent".to_string()),
            performed_by: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_validation_rejects_unknown_priority() {
        let mut cmd = command(Uuid::new_v4());
        cmd.priority = Some("whenever".to_string());
        assert!(matches!(
            cmd.validate(),
            Err(CreateTestOrderError::PriorityInvalid)
        ));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_creates_order_with_flat_audit_payload(pool: PgPool) -> sqlx::Result<()> {
        let patient = TestPatient::new("MRN-6001").insert(&pool).await?;

        let response = handle(pool.clone(), command(patient.id)).await.unwrap();
        assert_eq!(response.status, "pending");
        assert_eq!(response.priority, "urgent");

        // Create rows under the flat shape keep the full snapshot in
        // new_values and no changed-field list.
        let (action, new_values, changed_fields): (String, serde_json::Value, Option<serde_json::Value>) =
            sqlx::query_as(
                "SELECT action, new_values, changed_fields FROM audit_log WHERE entity_id = $1",
            )
            .bind(response.id)
            .fetch_one(&pool)
            .await?;
        assert_eq!(action, "create");
        assert_eq!(new_values["test_type"], "CBC");
        assert!(changed_fields.is_none());
        Ok(())
    }
}
