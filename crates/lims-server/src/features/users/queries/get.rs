//! Get user query

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::super::model::{find_user, User};

/// Query to fetch a single user by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserQuery {
    pub id: Uuid,
}

pub type GetUserResponse = User;

/// Errors that can occur when fetching a user
#[derive(Debug, thiserror::Error)]
pub enum GetUserError {
    #[error("User {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<GetUserResponse, GetUserError>> for GetUserQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetUserQuery) -> Result<GetUserResponse, GetUserError> {
    find_user(&pool, query.id)
        .await?
        .ok_or(GetUserError::NotFound(query.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestUser;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_returns_user(pool: PgPool) -> sqlx::Result<()> {
        let user = TestUser::new("md@lab.example.org")
            .with_role("physician")
            .insert(&pool)
            .await?;

        let response = handle(pool.clone(), GetUserQuery { id: user.id })
            .await
            .unwrap();
        assert_eq!(response.role, "physician");
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_missing_user(pool: PgPool) -> sqlx::Result<()> {
        let result = handle(pool.clone(), GetUserQuery { id: Uuid::new_v4() }).await;
        assert!(matches!(result, Err(GetUserError::NotFound(_))));
        Ok(())
    }
}
