//! Update test order command
//!
//! Moves an order through its lifecycle: reprioritize, record a result,
//! change status. Patient and test type are fixed once the order is placed.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditBehavior, AuditableCommand};
use crate::features::shared::validation::{validate_length, validate_one_of};
use crate::uow::{UnitOfWork, UowError};

use super::super::entity::{find_test_order, ORDER_PRIORITIES, ORDER_STATUSES};

/// Command to update an existing test order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTestOrderCommand {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_value: Option<String>,
    pub performed_by: Uuid,
}

/// Response from updating a test order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTestOrderResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub test_type: String,
    pub priority: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur when updating a test order
#[derive(Debug, thiserror::Error)]
pub enum UpdateTestOrderError {
    /// No fields were provided for update
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    /// Priority is not one of the allowed values
    #[error("Priority must be one of: stat, urgent, routine")]
    PriorityInvalid,
    /// Status is not one of the allowed values
    #[error("Status must be one of: pending, collected, in_progress, completed, cancelled")]
    StatusInvalid,
    /// Result value exceeds 512 characters
    #[error("Result value must be at most 512 characters")]
    ResultInvalid,
    /// No order with the given id exists
    #[error("Test order {0} not found")]
    NotFound(Uuid),
    /// Unit-of-work or transaction failure
    #[error(transparent)]
    Uow(#[from] UowError),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<UpdateTestOrderResponse, UpdateTestOrderError>> for UpdateTestOrderCommand {}

impl AuditableCommand for UpdateTestOrderCommand {
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

impl UpdateTestOrderCommand {
    pub fn validate(&self) -> Result<(), UpdateTestOrderError> {
        if self.priority.is_none() && self.status.is_none() && self.result_value.is_none() {
            return Err(UpdateTestOrderError::NoFieldsToUpdate);
        }
        if let Some(ref priority) = self.priority {
            if !validate_one_of(priority, ORDER_PRIORITIES) {
                return Err(UpdateTestOrderError::PriorityInvalid);
            }
        }
        if let Some(ref status) = self.status {
            if !validate_one_of(status, ORDER_STATUSES) {
                return Err(UpdateTestOrderError::StatusInvalid);
            }
        }
        if let Some(ref result) = self.result_value {
            if !validate_length(result, 512) {
                return Err(UpdateTestOrderError::ResultInvalid);
            }
        }
        Ok(())
    }
}

/// Handles the update test order command
#[tracing::instrument(skip(pool, command), fields(order_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: UpdateTestOrderCommand,
) -> Result<UpdateTestOrderResponse, UpdateTestOrderError> {
    command.validate()?;

    let order = find_test_order(&pool, command.id)
        .await?
        .ok_or(UpdateTestOrderError::NotFound(command.id))?;

    let mut uow = UnitOfWork::new(pool);
    let key = uow.track_loaded(order.clone())?;

    let mut updated = order;
    if let Some(ref priority) = command.priority {
        updated.priority = priority.clone();
    }
    if let Some(ref status) = command.status {
        updated.status = status.clone();
    }
    if let Some(ref result) = command.result_value {
        updated.result_value = Some(result.clone());
    }
    updated.updated_at = Utc::now();

    let behavior = AuditBehavior::test_orders();
    behavior
        .execute(&mut uow, &command, |uow| {
            let updated = updated.clone();
            Box::pin(async move {
                uow.stage(key, updated)?;
                Ok::<_, UpdateTestOrderError>(())
            })
        })
        .await?;

    tracing::info!(order_id = %updated.id, status = %updated.status, "Test order updated");

    Ok(UpdateTestOrderResponse {
        id: updated.id,
        patient_id: updated.patient_id,
        test_type: updated.test_type,
        priority: updated.priority,
        status: updated.status,
        result_value: updated.result_value,
        updated_at: updated.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{TestPatient, TestTestOrder};

    #[test]
    fn test_validation_requires_a_field() {
        let cmd = UpdateTestOrderCommand {
            id: Uuid::new_v4(),
            priority: None,
            status: None,
            result_value: None,
            performed_by: Uuid::new_v4(),
        };
        assert!(matches!(
            cmd.validate(),
            Err(UpdateTestOrderError::NoFieldsToUpdate)
        ));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_records_result_with_flat_payload(pool: PgPool) -> sqlx::Result<()> {
        let patient = TestPatient::new("MRN-7001").insert(&pool).await?;
        let technician = Uuid::new_v4();
        let order = TestTestOrder::new(patient.id, technician, "CBC")
            .insert(&pool)
            .await?;

        let cmd = UpdateTestOrderCommand {
            id: order.id,
            priority: None,
            status: Some("completed".to_string()),
            result_value: Some("WBC 6.1 x10^9/L".to_string()),
            performed_by: technician,
        };
        let response = handle(pool.clone(), cmd).await.unwrap();
        assert_eq!(response.status, "completed");

        // Flat shape: array of field names plus separate old/new maps. The
        // first result has no old side and shows up as null.
        let (changed_fields, old_values, new_values): (
            serde_json::Value,
            serde_json::Value,
            serde_json::Value,
        ) = sqlx::query_as(
            "SELECT changed_fields, old_values, new_values FROM audit_log WHERE entity_id = $1",
        )
        .bind(order.id)
        .fetch_one(&pool)
        .await?;

        let fields: Vec<String> =
            serde_json::from_value(changed_fields).expect("changed_fields array");
        assert!(fields.contains(&"status".to_string()));
        assert!(fields.contains(&"result_value".to_string()));
        assert_eq!(old_values["status"], "pending");
        assert!(old_values["result_value"].is_null());
        assert_eq!(new_values["result_value"], "WBC 6.1 x10^9/L");
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_no_op_update_writes_no_audit_row(pool: PgPool) -> sqlx::Result<()> {
        let patient = TestPatient::new("MRN-7002").insert(&pool).await?;
        let order = TestTestOrder::new(patient.id, Uuid::new_v4(), "CBC")
            .with_priority("urgent")
            .insert(&pool)
            .await?;

        // Staging identical values leaves the entity unchanged after the
        // post-handler diff, so no audit row is written.
        let cmd = UpdateTestOrderCommand {
            id: order.id,
            priority: Some("urgent".to_string()),
            status: None,
            result_value: None,
            performed_by: Uuid::new_v4(),
        };
        handle(pool.clone(), cmd).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0);
        Ok(())
    }
}
