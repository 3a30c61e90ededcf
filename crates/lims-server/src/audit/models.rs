//! Audit data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::uow::{EntityKind, EntityState};

// ============================================================================
// Audit Query Constants
// ============================================================================

/// Default number of audit entries returned per query
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 100;

/// Maximum number of audit entries that can be returned in a single query.
/// This prevents excessive memory usage and query timeouts.
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

/// Persisted audit action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Map a tracked entity's lifecycle state to the persisted action.
    ///
    /// `Unchanged` entities produce no audit row, hence no action.
    pub fn from_state(state: EntityState) -> Option<Self> {
        match state {
            EntityState::Added => Some(Self::Create),
            EntityState::Modified => Some(Self::Update),
            EntityState::Deleted => Some(Self::Delete),
            EntityState::Unchanged => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit log row as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLogRow {
    /// Surrogate key for the audit entry
    pub id: Uuid,
    /// Kind of the mutated entity
    pub entity_kind: String,
    /// Primary key of the mutated row (null when unrecoverable after delete)
    pub entity_id: Option<Uuid>,
    /// Action performed: create, update, or delete
    pub action: String,
    /// Identity of the acting user, taken from the command
    pub performed_by: Uuid,
    /// Commit-time UTC instant
    pub timestamp: DateTime<Utc>,
    /// Serialized changed-field payload, shape depends on the watched type
    pub changed_fields: Option<JsonValue>,
    /// Pre-mutation values for the changed fields
    pub old_values: Option<JsonValue>,
    /// Post-mutation values for the changed fields
    pub new_values: Option<JsonValue>,
}

/// Input for one audit row, built from an [`AuditEntry`](super::AuditEntry)
/// just before insertion
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub entity_kind: EntityKind,
    pub entity_id: Option<Uuid>,
    pub action: AuditAction,
    pub performed_by: Uuid,
    pub changed_fields: Option<JsonValue>,
    pub old_values: Option<JsonValue>,
    pub new_values: Option<JsonValue>,
}

/// Query parameters for reading audit logs
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// Filter by acting user
    pub performed_by: Option<Uuid>,
    /// Filter by action
    pub action: Option<AuditAction>,
    /// Filter by entity kind
    pub entity_kind: Option<EntityKind>,
    /// Filter by entity id
    pub entity_id: Option<Uuid>,
    /// Start timestamp for range query
    pub start_time: Option<DateTime<Utc>>,
    /// End timestamp for range query
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results to return
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Offset for pagination
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_AUDIT_QUERY_LIMIT
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            performed_by: None,
            action: None,
            entity_kind: None,
            entity_id: None,
            start_time: None,
            end_time: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}
