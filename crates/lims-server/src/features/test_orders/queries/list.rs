//! List test orders query
//!
//! Paginated listing, filterable by patient, status, and priority. Pending
//! stat orders are what lab staff look for, so priority filtering matters.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::pagination::{Paginated, PaginationParams};

/// Query to list test orders
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListTestOrdersQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

/// One row in the list response
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TestOrderListItem {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub test_type: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub type ListTestOrdersResponse = Paginated<TestOrderListItem>;

/// Errors that can occur when listing test orders
#[derive(Debug, thiserror::Error)]
pub enum ListTestOrdersError {
    #[error("Invalid pagination: {0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ListTestOrdersResponse, ListTestOrdersError>> for ListTestOrdersQuery {}

#[tracing::instrument(skip(pool, query), fields(patient_id = ?query.patient_id, status = ?query.status))]
pub async fn handle(
    pool: PgPool,
    query: ListTestOrdersQuery,
) -> Result<ListTestOrdersResponse, ListTestOrdersError> {
    query
        .pagination
        .validate()
        .map_err(ListTestOrdersError::InvalidPagination)?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM test_orders
        WHERE ($1::uuid IS NULL OR patient_id = $1)
          AND ($2::varchar IS NULL OR status = $2)
          AND ($3::varchar IS NULL OR priority = $3)
        "#,
    )
    .bind(query.patient_id)
    .bind(&query.status)
    .bind(&query.priority)
    .fetch_one(&pool)
    .await?;

    let items = sqlx::query_as::<_, TestOrderListItem>(
        r#"
        SELECT id, patient_id, test_type, priority, status, created_at
        FROM test_orders
        WHERE ($1::uuid IS NULL OR patient_id = $1)
          AND ($2::varchar IS NULL OR status = $2)
          AND ($3::varchar IS NULL OR priority = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(query.patient_id)
    .bind(&query.status)
    .bind(&query.priority)
    .bind(query.pagination.per_page())
    .bind(query.pagination.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Paginated::from_items(items, &query.pagination, total))
}
