//! Serialization of changed-field payloads
//!
//! The two watched entity types historically serialized their change payloads
//! differently: medical records store one old/new pair per field, test orders
//! store a flat field list with separate old- and new-value maps. Both shapes
//! are kept, selected per watched type when the behavior is constructed.

use serde_json::{json, Map, Value};

use super::entry::AuditEntry;

/// Shape of the serialized change payload for one watched entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `changed_fields` is a JSON array of field names; `old_values` and
    /// `new_values` are flat maps of field name to value.
    FlatFields,
    /// `changed_fields` is a map of field name to `{"old": .., "new": ..}`;
    /// the old/new columns stay empty.
    PairedOldNew,
}

/// Rendered payload columns for one audit row; each part is omitted when empty
#[derive(Debug, Clone, Default)]
pub struct ChangePayload {
    pub changed_fields: Option<Value>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

impl PayloadShape {
    /// Render an entry's diff into the three payload columns.
    pub fn render(&self, entry: &AuditEntry) -> ChangePayload {
        match self {
            Self::FlatFields => ChangePayload {
                changed_fields: non_empty_array(&entry.changed_fields),
                old_values: non_empty_object(&entry.old_values),
                new_values: non_empty_object(&entry.new_values),
            },
            Self::PairedOldNew => {
                let mut pairs = Map::new();
                for field in keys_union(&entry.old_values, &entry.new_values) {
                    pairs.insert(
                        field.clone(),
                        json!({
                            "old": entry.old_values.get(&field).cloned().unwrap_or(Value::Null),
                            "new": entry.new_values.get(&field).cloned().unwrap_or(Value::Null),
                        }),
                    );
                }
                ChangePayload {
                    changed_fields: if pairs.is_empty() {
                        None
                    } else {
                        Some(Value::Object(pairs))
                    },
                    old_values: None,
                    new_values: None,
                }
            },
        }
    }
}

fn non_empty_array(fields: &[String]) -> Option<Value> {
    if fields.is_empty() {
        None
    } else {
        Some(Value::Array(
            fields.iter().cloned().map(Value::String).collect(),
        ))
    }
}

fn non_empty_object(map: &Map<String, Value>) -> Option<Value> {
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map.clone()))
    }
}

fn keys_union(a: &Map<String, Value>, b: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = a.keys().cloned().collect();
    for key in b.keys() {
        if !a.contains_key(key) {
            keys.push(key.clone());
        }
    }
    keys.sort();
    keys
}
