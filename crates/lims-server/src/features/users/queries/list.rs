//! List users query

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::pagination::{Paginated, PaginationParams};

use super::super::model::User;

/// Query to list users
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

pub type ListUsersResponse = Paginated<User>;

/// Errors that can occur when listing users
#[derive(Debug, thiserror::Error)]
pub enum ListUsersError {
    #[error("Invalid pagination: {0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ListUsersResponse, ListUsersError>> for ListUsersQuery {}

#[tracing::instrument(skip(pool, query), fields(role = ?query.role))]
pub async fn handle(pool: PgPool, query: ListUsersQuery) -> Result<ListUsersResponse, ListUsersError> {
    query
        .pagination
        .validate()
        .map_err(ListUsersError::InvalidPagination)?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM users
        WHERE ($1::varchar IS NULL OR role = $1)
          AND ($2::boolean IS NULL OR is_active = $2)
        "#,
    )
    .bind(&query.role)
    .bind(query.is_active)
    .fetch_one(&pool)
    .await?;

    let items = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, full_name, role, is_active, created_at, updated_at
        FROM users
        WHERE ($1::varchar IS NULL OR role = $1)
          AND ($2::boolean IS NULL OR is_active = $2)
        ORDER BY email
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&query.role)
    .bind(query.is_active)
    .bind(query.pagination.per_page())
    .bind(query.pagination.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Paginated::from_items(items, &query.pagination, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestUser;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_filters_by_role(pool: PgPool) -> sqlx::Result<()> {
        TestUser::new("a@lab.example.org").insert(&pool).await?;
        TestUser::new("b@lab.example.org")
            .with_role("physician")
            .insert(&pool)
            .await?;

        let query = ListUsersQuery {
            role: Some("physician".to_string()),
            ..Default::default()
        };
        let response = handle(pool.clone(), query).await.unwrap();
        assert_eq!(response.pagination.total, 1);
        assert_eq!(response.items[0].email, "b@lab.example.org");
        Ok(())
    }
}
