//! Tracked-entity contract
//!
//! Each watched entity type implements [`TrackedEntity`] with its own
//! explicit key extraction and persistence statements. There is deliberately
//! no generic key finder: one implementation per watched type keeps the SQL
//! and the key column visible at the call site.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{EntityKind, UowError};

/// A persistable entity the unit of work can track and diff
#[async_trait]
pub trait TrackedEntity: Send + Sync + 'static {
    /// Which kind of entity this is, for audit rows and error messages.
    fn kind(&self) -> EntityKind;

    /// Primary key, once assigned. Added entities may return `None` until
    /// their insert has run.
    fn entity_id(&self) -> Option<Uuid>;

    /// Field-by-field snapshot of the current in-memory values.
    fn values(&self) -> Result<Map<String, Value>, serde_json::Error>;

    /// Insert a new row. Implementations must resolve any not-yet-assigned
    /// key before returning so audit rows can reference it.
    async fn insert(&mut self, conn: &mut PgConnection) -> Result<(), UowError>;

    /// Update the existing row. Implementations carrying a version token
    /// must match on the previous version and raise [`UowError::Conflict`]
    /// when zero rows match.
    async fn update(&self, conn: &mut PgConnection) -> Result<(), UowError>;

    /// Delete the existing row.
    async fn delete(&self, conn: &mut PgConnection) -> Result<(), UowError>;
}

/// Snapshot helper: serialize an entity into a flat field map.
///
/// Entities are plain structs with serde derives, so their JSON object form
/// is exactly the field snapshot the differ needs.
pub fn snapshot_values<T: Serialize>(entity: &T) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "entity serialized to {} instead of an object",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_values_flattens_struct() {
        #[derive(Serialize)]
        struct Row {
            id: Uuid,
            name: String,
        }

        let row = Row {
            id: Uuid::new_v4(),
            name: "sample".to_string(),
        };
        let map = snapshot_values(&row).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["name"], Value::String("sample".to_string()));
    }

    #[test]
    fn test_snapshot_values_rejects_non_object() {
        let err = snapshot_values(&42).unwrap_err();
        assert!(err.to_string().contains("number"));
    }
}
