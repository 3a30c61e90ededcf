//! Delete user command
//!
//! Hard delete. Audit rows keep their `performed_by` id even after the
//! account is gone; the column is deliberately not a foreign key.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Command to delete a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserCommand {
    pub id: Uuid,
}

/// Response from deleting a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub id: Uuid,
}

/// Errors that can occur when deleting a user
#[derive(Debug, thiserror::Error)]
pub enum DeleteUserError {
    /// No user with the given id exists
    #[error("User {0} not found")]
    NotFound(Uuid),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DeleteUserResponse, DeleteUserError>> for DeleteUserCommand {}

/// Handles the delete user command
#[tracing::instrument(skip(pool), fields(user_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: DeleteUserCommand,
) -> Result<DeleteUserResponse, DeleteUserError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(command.id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DeleteUserError::NotFound(command.id));
    }

    tracing::info!(user_id = %command.id, "User deleted");
    Ok(DeleteUserResponse { id: command.id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestUser;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_deletes_user(pool: PgPool) -> sqlx::Result<()> {
        let user = TestUser::new("gone@lab.example.org").insert(&pool).await?;

        handle(pool.clone(), DeleteUserCommand { id: user.id })
            .await
            .unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await?;
        assert_eq!(remaining, 0);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_missing_user(pool: PgPool) -> sqlx::Result<()> {
        let result = handle(pool.clone(), DeleteUserCommand { id: Uuid::new_v4() }).await;
        assert!(matches!(result, Err(DeleteUserError::NotFound(_))));
        Ok(())
    }
}
