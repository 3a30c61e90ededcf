//! List medical records query
//!
//! Paginated listing, optionally filtered by patient and status.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::pagination::{Paginated, PaginationParams};

/// Query to list medical records
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListMedicalRecordsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One row in the list response
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MedicalRecordListItem {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    pub status: String,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

pub type ListMedicalRecordsResponse = Paginated<MedicalRecordListItem>;

/// Errors that can occur when listing medical records
#[derive(Debug, thiserror::Error)]
pub enum ListMedicalRecordsError {
    #[error("Invalid pagination: {0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ListMedicalRecordsResponse, ListMedicalRecordsError>>
    for ListMedicalRecordsQuery
{
}

#[tracing::instrument(skip(pool, query), fields(patient_id = ?query.patient_id))]
pub async fn handle(
    pool: PgPool,
    query: ListMedicalRecordsQuery,
) -> Result<ListMedicalRecordsResponse, ListMedicalRecordsError> {
    query
        .pagination
        .validate()
        .map_err(ListMedicalRecordsError::InvalidPagination)?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM medical_records
        WHERE ($1::uuid IS NULL OR patient_id = $1)
          AND ($2::varchar IS NULL OR status = $2)
        "#,
    )
    .bind(query.patient_id)
    .bind(&query.status)
    .fetch_one(&pool)
    .await?;

    let items = sqlx::query_as::<_, MedicalRecordListItem>(
        r#"
        SELECT id, patient_id, diagnosis, status, version, updated_at
        FROM medical_records
        WHERE ($1::uuid IS NULL OR patient_id = $1)
          AND ($2::varchar IS NULL OR status = $2)
        ORDER BY updated_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(query.patient_id)
    .bind(&query.status)
    .bind(query.pagination.per_page())
    .bind(query.pagination.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Paginated::from_items(items, &query.pagination, total))
}
