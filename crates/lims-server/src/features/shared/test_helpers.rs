//! Test fixtures for database tests
//!
//! Builder-style fixtures that insert rows directly, bypassing the command
//! layer, so tests can set up state without triggering audit rows.
//!
//! # Examples
//!
//! ```rust,ignore
//! use lims_server::features::shared::test_helpers::*;
//!
//! #[sqlx::test]
//! async fn test_something(pool: PgPool) -> sqlx::Result<()> {
//!     let patient = TestPatient::new("MRN-0001").insert(&pool).await?;
//!     let record = TestMedicalRecord::new(patient.id, "Influenza A")
//!         .insert(&pool)
//!         .await?;
//!     // ... test logic ...
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

/// Builder for test users
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
}

impl TestUser {
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            role: "technician".to_string(),
            is_active: true,
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(self.id)
        .bind(&self.email)
        .bind(&self.full_name)
        .bind(&self.role)
        .bind(self.is_active)
        .execute(pool)
        .await?;

        Ok(self)
    }
}

/// Builder for test patients
#[derive(Debug, Clone)]
pub struct TestPatient {
    pub id: Uuid,
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

impl TestPatient {
    pub fn new(mrn: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            mrn: mrn.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap_or_default(),
        }
    }

    pub fn with_name(mut self, first: &str, last: &str) -> Self {
        self.first_name = first.to_string();
        self.last_name = last.to_string();
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO patients (id, mrn, first_name, last_name, date_of_birth)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(self.id)
        .bind(&self.mrn)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(self.date_of_birth)
        .execute(pool)
        .await?;

        Ok(self)
    }
}

/// Builder for test medical records
#[derive(Debug, Clone)]
pub struct TestMedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub status: String,
    pub version: i32,
}

impl TestMedicalRecord {
    pub fn new(patient_id: Uuid, diagnosis: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            diagnosis: diagnosis.to_string(),
            notes: None,
            status: "open".to_string(),
            version: 1,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO medical_records (id, patient_id, diagnosis, notes, status, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(&self.diagnosis)
        .bind(&self.notes)
        .bind(&self.status)
        .bind(self.version)
        .execute(pool)
        .await?;

        Ok(self)
    }
}

/// Builder for test lab-test orders
#[derive(Debug, Clone)]
pub struct TestTestOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub ordered_by: Uuid,
    pub test_type: String,
    pub priority: String,
    pub status: String,
    pub result_value: Option<String>,
}

impl TestTestOrder {
    pub fn new(patient_id: Uuid, ordered_by: Uuid, test_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            ordered_by,
            test_type: test_type.to_string(),
            priority: "routine".to_string(),
            status: "pending".to_string(),
            result_value: None,
        }
    }

    pub fn with_priority(mut self, priority: &str) -> Self {
        self.priority = priority.to_string();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO test_orders (id, patient_id, ordered_by, test_type, priority, status, result_value)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(self.ordered_by)
        .bind(&self.test_type)
        .bind(&self.priority)
        .bind(&self.status)
        .bind(&self.result_value)
        .execute(pool)
        .await?;

        Ok(self)
    }
}

/// Count audit rows for one entity id.
pub async fn audit_row_count(pool: &PgPool, entity_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE entity_id = $1")
        .bind(entity_id)
        .fetch_one(pool)
        .await
}
