//! Cancel-and-remove test order command

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditBehavior, AuditableCommand};
use crate::uow::{UnitOfWork, UowError};

use super::super::entity::find_test_order;

/// Command to delete a test order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTestOrderCommand {
    pub id: Uuid,
    pub performed_by: Uuid,
}

/// Response from deleting a test order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTestOrderResponse {
    pub id: Uuid,
}

/// Errors that can occur when deleting a test order
#[derive(Debug, thiserror::Error)]
pub enum DeleteTestOrderError {
    /// No order with the given id exists
    #[error("Test order {0} not found")]
    NotFound(Uuid),
    /// Completed orders carry reported results and must not be removed
    #[error("Test order {0} is completed and cannot be deleted")]
    Completed(Uuid),
    /// Unit-of-work or transaction failure
    #[error(transparent)]
    Uow(#[from] UowError),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DeleteTestOrderResponse, DeleteTestOrderError>> for DeleteTestOrderCommand {}

impl AuditableCommand for DeleteTestOrderCommand {
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

/// Handles the delete test order command
#[tracing::instrument(skip(pool, command), fields(order_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: DeleteTestOrderCommand,
) -> Result<DeleteTestOrderResponse, DeleteTestOrderError> {
    let order = find_test_order(&pool, command.id)
        .await?
        .ok_or(DeleteTestOrderError::NotFound(command.id))?;
    if order.status == "completed" {
        return Err(DeleteTestOrderError::Completed(order.id));
    }
    let order_id = order.id;

    let mut uow = UnitOfWork::new(pool);
    let key = uow.track_loaded(order)?;

    let behavior = AuditBehavior::test_orders();
    behavior
        .execute(&mut uow, &command, |uow| {
            Box::pin(async move {
                uow.mark_deleted(key)?;
                Ok::<_, DeleteTestOrderError>(())
            })
        })
        .await?;

    tracing::info!(order_id = %order_id, "Test order deleted");

    Ok(DeleteTestOrderResponse { id: order_id })
}
