//! Lab test order entity and persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::uow::{snapshot_values, EntityKind, TrackedEntity, UowError};

/// Allowed order priorities
pub const ORDER_PRIORITIES: &[&str] = &["stat", "urgent", "routine"];

/// Allowed order statuses
pub const ORDER_STATUSES: &[&str] = &["pending", "collected", "in_progress", "completed", "cancelled"];

/// A lab test order row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TestOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// User who placed the order.
    pub ordered_by: Uuid,
    pub test_type: String,
    pub priority: String,
    pub status: String,
    /// Omitted from snapshots while unset, so a first result shows up as a
    /// newly appearing field in the diff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_value: Option<String>,
    /// Timestamps are database-managed and kept out of snapshots so they
    /// never show up as dirty fields in audit diffs.
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

impl TestOrder {
    pub fn new(patient_id: Uuid, ordered_by: Uuid, test_type: String, priority: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            ordered_by,
            test_type,
            priority,
            status: "pending".to_string(),
            result_value: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl TrackedEntity for TestOrder {
    fn kind(&self) -> EntityKind {
        EntityKind::TestOrder
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
            INSERT INTO test_orders
                (id, patient_id, ordered_by, test_type, priority, status, result_value,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(self.ordered_by)
        .bind(&self.test_type)
        .bind(&self.priority)
        .bind(&self.status)
        .bind(&self.result_value)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn update(&self, conn: &mut PgConnection) -> Result<(), UowError> {
        let result = sqlx::query(
            r#"
            UPDATE test_orders
            SET priority = $2, status = $3, result_value = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(self.id)
        .bind(&self.priority)
        .bind(&self.status)
        .bind(&self.result_value)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UowError::RowMissing {
                kind: EntityKind::TestOrder,
                id: self.id,
            });
        }
        Ok(())
    }

    async fn delete(&self, conn: &mut PgConnection) -> Result<(), UowError> {
        let result = sqlx::query("DELETE FROM test_orders WHERE id = $1")
            .bind(self.id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UowError::RowMissing {
                kind: EntityKind::TestOrder,
                id: self.id,
            });
        }
        Ok(())
    }
}

/// Load one test order by id.
pub async fn find_test_order(pool: &PgPool, id: Uuid) -> Result<Option<TestOrder>, sqlx::Error> {
    sqlx::query_as::<_, TestOrder>(
        r#"
        SELECT id, patient_id, ordered_by, test_type, priority, status, result_value,
               created_at, updated_at
        FROM test_orders
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
