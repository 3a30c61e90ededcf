//! Get test order query

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::super::entity::find_test_order;

/// Query to fetch a single test order by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTestOrderQuery {
    pub id: Uuid,
}

/// Response for a single test order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTestOrderResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub ordered_by: Uuid,
    pub test_type: String,
    pub priority: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_value: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur when fetching a test order
#[derive(Debug, thiserror::Error)]
pub enum GetTestOrderError {
    #[error("Test order {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<GetTestOrderResponse, GetTestOrderError>> for GetTestOrderQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: GetTestOrderQuery,
) -> Result<GetTestOrderResponse, GetTestOrderError> {
    let order = find_test_order(&pool, query.id)
        .await?
        .ok_or(GetTestOrderError::NotFound(query.id))?;

    Ok(GetTestOrderResponse {
        id: order.id,
        patient_id: order.patient_id,
        ordered_by: order.ordered_by,
        test_type: order.test_type,
        priority: order.priority,
        status: order.status,
        result_value: order.result_value,
        created_at: order.created_at,
        updated_at: order.updated_at,
    })
}
