//! Fixtures shared by the integration test binaries.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a patient row and return its id.
pub async fn insert_patient(pool: &PgPool, mrn: &str) -> sqlx::Result<Uuid> {
    let dob = NaiveDate::from_ymd_opt(1984, 6, 15).unwrap_or_default();
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO patients (mrn, first_name, last_name, date_of_birth)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(mrn)
    .bind("Ada")
    .bind("Lovelace")
    .bind(dob)
    .fetch_one(pool)
    .await
}

/// Insert a staff user row and return its id.
pub async fn insert_user(pool: &PgPool, email: &str, role: &str) -> sqlx::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (email, full_name, role)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind("Test Clinician")
    .bind(role)
    .fetch_one(pool)
    .await
}

/// Count audit rows for one entity.
pub async fn audit_rows_for(pool: &PgPool, entity_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE entity_id = $1")
        .bind(entity_id)
        .fetch_one(pool)
        .await
}
