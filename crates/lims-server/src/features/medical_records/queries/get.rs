//! Get medical record query

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::super::entity::find_medical_record;

/// Query to fetch a single medical record by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMedicalRecordQuery {
    pub id: Uuid,
}

/// Response for a single medical record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMedicalRecordResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur when fetching a medical record
#[derive(Debug, thiserror::Error)]
pub enum GetMedicalRecordError {
    #[error("Medical record {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<GetMedicalRecordResponse, GetMedicalRecordError>> for GetMedicalRecordQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: GetMedicalRecordQuery,
) -> Result<GetMedicalRecordResponse, GetMedicalRecordError> {
    let record = find_medical_record(&pool, query.id)
        .await?
        .ok_or(GetMedicalRecordError::NotFound(query.id))?;

    Ok(GetMedicalRecordResponse {
        id: record.id,
        patient_id: record.patient_id,
        diagnosis: record.diagnosis,
        notes: record.notes,
        status: record.status,
        version: record.version,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}
