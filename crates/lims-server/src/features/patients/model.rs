//! Patient database model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Patient row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Patient {
    pub id: Uuid,
    /// Medical record number, the external patient identifier.
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Load one patient by id.
pub async fn find_patient(pool: &PgPool, id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        "SELECT id, mrn, first_name, last_name, date_of_birth, created_at FROM patients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// True when a patient row with this id exists.
pub async fn patient_exists(pool: &PgPool, patient_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM patients WHERE id = $1)")
        .bind(patient_id)
        .fetch_one(pool)
        .await
}
