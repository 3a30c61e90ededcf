//! Transient audit entries and before/after diff computation
//!
//! One [`AuditEntry`] describes one entity's transition within a single
//! command. Entries are created at the pre-handler snapshot (for entities
//! already tracked at that point) or first observed at the post-handler
//! snapshot (for entities added or deleted by the handler), and are discarded
//! once their audit row has been generated.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::uow::{EntityKind, EntityState, TrackKey, TrackedSnapshot};

/// In-memory record of one entity's transition, owned by a single
/// audit-behavior invocation
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Correlation key matching pre- and post-snapshot observations of the
    /// same tracked entity, independent of whether its primary key exists yet
    pub key: TrackKey,
    pub kind: EntityKind,
    pub entity_id: Option<Uuid>,
    /// Lifecycle state at the most recent capture
    pub action: EntityState,
    /// Names of fields whose value changed (Modified only), sorted
    pub changed_fields: Vec<String>,
    /// Field name -> pre-handler value, for fields found modified or deleted
    pub old_values: Map<String, Value>,
    /// Field name -> post-handler value, for added and modified fields
    pub new_values: Map<String, Value>,
}

impl AuditEntry {
    /// Capture an entry at the pre-handler snapshot.
    ///
    /// Records the capture-time lifecycle state and, for modified entities,
    /// the original value of every currently dirty field. Added entities
    /// cannot occur here: nothing has run yet.
    pub fn capture_pre(snap: &TrackedSnapshot) -> Self {
        let mut entry = Self {
            key: snap.key,
            kind: snap.kind,
            entity_id: snap.entity_id,
            action: snap.state,
            changed_fields: Vec::new(),
            old_values: Map::new(),
            new_values: Map::new(),
        };

        if snap.state == EntityState::Modified {
            entry.changed_fields = snap.dirty_fields();
            entry.old_values = pick(snap.original.as_ref(), &entry.changed_fields);
        } else if snap.state == EntityState::Deleted {
            entry.old_values = snap.original.clone().unwrap_or_default();
        }

        entry
    }

    /// Capture an entry first observed at the post-handler snapshot:
    /// an entity the handler added, deleted, or modified after loading.
    pub fn capture_post(snap: &TrackedSnapshot) -> Self {
        let mut entry = Self::capture_pre(snap);
        entry.fill_post(snap);
        entry
    }

    /// Fill in the post-handler side of the diff.
    ///
    /// For added entities the full current snapshot becomes the new-value
    /// set. For modified ones the dirty-field set is recomputed against the
    /// immutable pre-handler baseline, so fields that became dirty during the
    /// handler are picked up and fields staged back to their original value
    /// drop out. For deleted entities the captured-before-delete values are
    /// the old-value set and there is no new side.
    pub fn fill_post(&mut self, snap: &TrackedSnapshot) {
        self.action = snap.state;
        if self.entity_id.is_none() {
            self.entity_id = snap.entity_id;
        }

        match snap.state {
            EntityState::Added => {
                self.changed_fields.clear();
                self.old_values.clear();
                self.new_values = snap.current.clone();
            },
            EntityState::Modified => {
                self.changed_fields = snap.dirty_fields();
                self.old_values = pick(snap.original.as_ref(), &self.changed_fields);
                self.new_values = pick(Some(&snap.current), &self.changed_fields);
            },
            EntityState::Deleted => {
                self.changed_fields.clear();
                self.new_values.clear();
                // Entities added and deleted inside the same command have no
                // persisted baseline; fall back to the last staged values.
                self.old_values = snap
                    .original
                    .clone()
                    .unwrap_or_else(|| snap.current.clone());
            },
            EntityState::Unchanged => {
                // Reverted to its original values during the handler; the
                // behavior drops unchanged entries before building rows.
                self.changed_fields.clear();
                self.old_values.clear();
                self.new_values.clear();
            },
        }
    }
}

/// Project the named fields out of a snapshot map, substituting null for
/// fields absent on that side of the diff.
fn pick(source: Option<&Map<String, Value>>, fields: &[String]) -> Map<String, Value> {
    let mut out = Map::new();
    for field in fields {
        let value = source
            .and_then(|map| map.get(field))
            .cloned()
            .unwrap_or(Value::Null);
        out.insert(field.clone(), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn snapshot(
        state: EntityState,
        original: Option<Value>,
        current: Value,
    ) -> (TrackKey, TrackedSnapshot) {
        let snap = TrackedSnapshot {
            key: TrackKey::new(),
            kind: EntityKind::MedicalRecord,
            state,
            entity_id: Some(Uuid::new_v4()),
            original: original.map(object),
            current: object(current),
        };
        (snap.key, snap)
    }

    #[test]
    fn modified_entry_diffs_only_dirty_fields() {
        let (_, snap) = snapshot(
            EntityState::Modified,
            Some(json!({"diagnosis": "flu", "status": "open", "version": 1})),
            json!({"diagnosis": "pneumonia", "status": "open", "version": 2}),
        );

        let entry = AuditEntry::capture_post(&snap);
        assert_eq!(entry.changed_fields, vec!["diagnosis", "version"]);
        assert_eq!(entry.old_values["diagnosis"], json!("flu"));
        assert_eq!(entry.new_values["diagnosis"], json!("pneumonia"));
        assert_eq!(entry.old_values["version"], json!(1));
        assert_eq!(entry.new_values["version"], json!(2));
        assert!(!entry.old_values.contains_key("status"));
    }

    #[test]
    fn added_entry_captures_full_new_values() {
        let (_, snap) = snapshot(
            EntityState::Added,
            None,
            json!({"diagnosis": "flu", "status": "open"}),
        );

        let entry = AuditEntry::capture_post(&snap);
        assert_eq!(entry.action, EntityState::Added);
        assert!(entry.old_values.is_empty());
        assert_eq!(entry.new_values.len(), 2);
    }

    #[test]
    fn deleted_entry_keeps_before_delete_values() {
        let (_, snap) = snapshot(
            EntityState::Deleted,
            Some(json!({"diagnosis": "flu", "status": "open"})),
            json!({"diagnosis": "flu", "status": "open"}),
        );

        let entry = AuditEntry::capture_post(&snap);
        assert_eq!(entry.action, EntityState::Deleted);
        assert!(entry.new_values.is_empty());
        assert_eq!(entry.old_values["diagnosis"], json!("flu"));
    }

    #[test]
    fn pre_entry_filled_at_post_picks_up_late_dirty_fields() {
        let (key, pre_snap) = snapshot(
            EntityState::Modified,
            Some(json!({"diagnosis": "flu", "status": "open"})),
            json!({"diagnosis": "pneumonia", "status": "open"}),
        );
        let mut entry = AuditEntry::capture_pre(&pre_snap);
        assert_eq!(entry.changed_fields, vec!["diagnosis"]);

        let post_snap = TrackedSnapshot {
            key,
            current: object(json!({"diagnosis": "pneumonia", "status": "closed"})),
            ..pre_snap
        };
        entry.fill_post(&post_snap);
        assert_eq!(entry.changed_fields, vec!["diagnosis", "status"]);
        assert_eq!(entry.old_values["status"], json!("open"));
        assert_eq!(entry.new_values["status"], json!("closed"));
    }
}
