//! Medical record entity and persistence
//!
//! `MedicalRecord` is a tracked entity: command handlers load it, register
//! it with the unit of work, and stage mutated copies. It carries a version
//! token for optimistic concurrency. Handlers bump `version` on every staged
//! mutation; the UPDATE statement matches the previous value, and a zero-row
//! update surfaces as a concurrency conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::uow::{snapshot_values, EntityKind, TrackedEntity, UowError};

/// Allowed record statuses
pub const RECORD_STATUSES: &[&str] = &["open", "closed", "amended"];

/// A patient's medical record row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub status: String,
    /// Optimistic-concurrency token, starts at 1 and grows by one per update.
    pub version: i32,
    /// Timestamps are database-managed and kept out of snapshots so they
    /// never show up as dirty fields in audit diffs.
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

impl MedicalRecord {
    pub fn new(patient_id: Uuid, diagnosis: String, notes: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            diagnosis,
            notes,
            status: "open".to_string(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl TrackedEntity for MedicalRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::MedicalRecord
    }

    fn entity_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn values(&self) -> Result<Map<String, Value>, serde_json::Error> {
        snapshot_values(self)
    }

    async fn insert(&mut self, conn: &mut PgConnection) -> Result<(), UowError> {
        sqlx::query(
            r#"
            INSERT INTO medical_records
                (id, patient_id, diagnosis, notes, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(&self.diagnosis)
        .bind(&self.notes)
        .bind(&self.status)
        .bind(self.version)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn update(&self, conn: &mut PgConnection) -> Result<(), UowError> {
        // The staged copy already carries the bumped version; the row must
        // still hold the previous one or someone else won the race.
        let expected = self.version - 1;
        let result = sqlx::query(
            r#"
            UPDATE medical_records
            SET patient_id = $2, diagnosis = $3, notes = $4, status = $5,
                version = $6, updated_at = NOW()
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(&self.diagnosis)
        .bind(&self.notes)
        .bind(&self.status)
        .bind(self.version)
        .bind(expected)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UowError::Conflict {
                kind: EntityKind::MedicalRecord,
                id: self.id,
                version: self.version,
            });
        }
        Ok(())
    }

    async fn delete(&self, conn: &mut PgConnection) -> Result<(), UowError> {
        let result = sqlx::query("DELETE FROM medical_records WHERE id = $1")
            .bind(self.id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UowError::RowMissing {
                kind: EntityKind::MedicalRecord,
                id: self.id,
            });
        }
        Ok(())
    }
}

/// Load one medical record by id.
pub async fn find_medical_record(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<MedicalRecord>, sqlx::Error> {
    sqlx::query_as::<_, MedicalRecord>(
        r#"
        SELECT id, patient_id, diagnosis, notes, status, version, created_at, updated_at
        FROM medical_records
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_starts_at_version_one() {
        let record = MedicalRecord::new(Uuid::new_v4(), "Influenza A".to_string(), None);
        assert_eq!(record.version, 1);
        assert_eq!(record.status, "open");
    }

    #[test]
    fn test_snapshot_has_business_fields_only() {
        let record = MedicalRecord::new(Uuid::new_v4(), "Influenza A".to_string(), None);
        let values = record.values().unwrap();
        for field in ["id", "patient_id", "diagnosis", "notes", "status", "version"] {
            assert!(values.contains_key(field), "missing {field}");
        }
        assert!(!values.contains_key("created_at"));
        assert!(!values.contains_key("updated_at"));
    }
}
