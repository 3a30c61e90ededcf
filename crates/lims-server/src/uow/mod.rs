//! Request-scoped unit of work with explicit change tracking
//!
//! Command handlers never talk to the database directly for writes. They load
//! rows, register them here, mutate in-memory copies, and stage the result.
//! The audit behavior then diffs the tracked snapshots and flushes everything
//! inside a single transaction.
//!
//! A `UnitOfWork` is owned by exactly one command invocation. It is created
//! per request, threaded through the handler by `&mut` reference, and
//! discarded after the commit. It must never be shared across commands.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut uow = UnitOfWork::new(pool.clone());
//! let record = find_record(uow.pool(), id).await?.ok_or(Error::NotFound(id))?;
//! let key = uow.track_loaded(record.clone())?;
//!
//! let mut updated = record;
//! updated.status = "closed".to_string();
//! updated.version += 1;
//! uow.stage(key, updated)?;
//!
//! let mut tx = uow.begin().await?;
//! uow.detect_changes()?;
//! uow.flush(&mut tx).await?;
//! tx.commit().await?;
//! ```

mod entity;

pub use entity::{snapshot_values, TrackedEntity};

use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Kinds of entities the unit of work can track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Patient,
    MedicalRecord,
    TestOrder,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Patient => "patient",
            Self::MedicalRecord => "medical_record",
            Self::TestOrder => "test_order",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a tracked entity within one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Loaded and not (yet) mutated
    Unchanged,
    /// New entity, no persisted row exists yet
    Added,
    /// Loaded entity whose staged values differ from the persisted snapshot
    Modified,
    /// Loaded entity scheduled for deletion
    Deleted,
}

/// Correlation key for a tracked entity, local to one unit of work.
///
/// Pre- and post-handler snapshots of the same logical entity are matched by
/// this key rather than by primary key, since an added entity may not have a
/// primary key at the time it is first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackKey(Uuid);

impl TrackKey {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by unit-of-work operations
#[derive(Debug, Error)]
pub enum UowError {
    /// The stored row's version token did not match the staged entity.
    /// The caller holds stale data and must reload before retrying.
    #[error("Concurrency conflict on {kind} {id}: version {version} does not match the stored row")]
    Conflict {
        kind: EntityKind,
        id: Uuid,
        version: i32,
    },

    /// The row vanished between load and flush (deleted by another request).
    #[error("{kind} {id} no longer exists")]
    RowMissing { kind: EntityKind, id: Uuid },

    /// No tracked entity matches the given correlation key.
    #[error("No tracked entity for correlation key {0}")]
    UnknownKey(TrackKey),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Snapshot serialization error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Owned view of one tracked entity's state, as seen by the audit behavior
#[derive(Debug, Clone)]
pub struct TrackedSnapshot {
    pub key: TrackKey,
    pub kind: EntityKind,
    pub state: EntityState,
    pub entity_id: Option<Uuid>,
    /// Persisted field values captured when the entity was first tracked.
    /// `None` for added entities.
    pub original: Option<Map<String, Value>>,
    /// In-memory field values as of the last `detect_changes`.
    pub current: Map<String, Value>,
}

impl TrackedSnapshot {
    /// Field names whose value differs between the persisted and in-memory
    /// snapshots, sorted for stable output.
    pub fn dirty_fields(&self) -> Vec<String> {
        let Some(original) = &self.original else {
            // Added entities: every field is new, none is "dirty".
            return Vec::new();
        };

        let mut fields: Vec<String> = self
            .current
            .iter()
            .filter(|(name, value)| original.get(*name) != Some(value))
            .map(|(name, _)| name.clone())
            .collect();
        for name in original.keys() {
            if !self.current.contains_key(name) {
                fields.push(name.clone());
            }
        }
        fields.sort();
        fields
    }
}

struct Tracked {
    key: TrackKey,
    state: EntityState,
    original: Option<Map<String, Value>>,
    current: Map<String, Value>,
    entity: Box<dyn TrackedEntity>,
}

/// Explicit change-tracked unit of work over one Postgres pool
pub struct UnitOfWork {
    pool: PgPool,
    tracked: Vec<Tracked>,
}

impl UnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tracked: Vec::new(),
        }
    }

    /// The underlying pool, for plain reads inside handlers.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Register an entity loaded from the database.
    ///
    /// Captures the persisted snapshot as the diff baseline. The entity
    /// starts `Unchanged`; staging a mutated copy and running
    /// `detect_changes` promotes it to `Modified`.
    pub fn track_loaded<E: TrackedEntity>(&mut self, entity: E) -> Result<TrackKey, UowError> {
        self.track(entity, EntityState::Unchanged, true)
    }

    /// Register a brand-new entity to be inserted at flush time.
    pub fn track_added<E: TrackedEntity>(&mut self, entity: E) -> Result<TrackKey, UowError> {
        self.track(entity, EntityState::Added, false)
    }

    fn track<E: TrackedEntity>(
        &mut self,
        entity: E,
        state: EntityState,
        keep_original: bool,
    ) -> Result<TrackKey, UowError> {
        let values = entity.values()?;
        let key = TrackKey::new();
        self.tracked.push(Tracked {
            key,
            state,
            original: keep_original.then(|| values.clone()),
            current: values,
            entity: Box::new(entity),
        });
        Ok(key)
    }

    /// Replace the in-memory value of a tracked entity with a mutated copy.
    pub fn stage<E: TrackedEntity>(&mut self, key: TrackKey, entity: E) -> Result<(), UowError> {
        let tracked = self.tracked_mut(key)?;
        tracked.current = entity.values()?;
        tracked.entity = Box::new(entity);
        Ok(())
    }

    /// Schedule a tracked entity for deletion at flush time.
    pub fn mark_deleted(&mut self, key: TrackKey) -> Result<(), UowError> {
        self.tracked_mut(key)?.state = EntityState::Deleted;
        Ok(())
    }

    fn tracked_mut(&mut self, key: TrackKey) -> Result<&mut Tracked, UowError> {
        self.tracked
            .iter_mut()
            .find(|t| t.key == key)
            .ok_or(UowError::UnknownKey(key))
    }

    /// Recompute every tracked entity's current snapshot and lifecycle state.
    ///
    /// Entities whose snapshot differs from the persisted baseline are
    /// promoted `Unchanged` -> `Modified`; ones staged back to their original
    /// values fall back to `Unchanged`. `Added` and `Deleted` are terminal.
    pub fn detect_changes(&mut self) -> Result<(), UowError> {
        for tracked in &mut self.tracked {
            tracked.current = tracked.entity.values()?;
            tracked.state = match tracked.state {
                EntityState::Added | EntityState::Deleted => tracked.state,
                EntityState::Unchanged | EntityState::Modified => {
                    if tracked.original.as_ref() == Some(&tracked.current) {
                        EntityState::Unchanged
                    } else {
                        EntityState::Modified
                    }
                },
            };
        }
        Ok(())
    }

    /// Snapshots of every tracked entity of the given kind, in tracking order.
    pub fn tracked_of_kind(&self, kind: EntityKind) -> Vec<TrackedSnapshot> {
        self.tracked
            .iter()
            .filter(|t| t.entity.kind() == kind)
            .map(|t| TrackedSnapshot {
                key: t.key,
                kind,
                state: t.state,
                entity_id: t.entity.entity_id(),
                original: t.original.clone(),
                current: t.current.clone(),
            })
            .collect()
    }

    /// Primary key of a tracked entity, if one has been assigned.
    pub fn entity_id(&self, key: TrackKey) -> Option<Uuid> {
        self.tracked
            .iter()
            .find(|t| t.key == key)
            .and_then(|t| t.entity.entity_id())
    }

    /// Open an explicit transaction on the underlying pool.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, UowError> {
        Ok(self.pool.begin().await?)
    }

    /// Persist every pending mutation on the given transaction.
    ///
    /// Added entities are inserted (which resolves any not-yet-assigned
    /// keys), modified ones updated, deleted ones removed. Unchanged entities
    /// are skipped. Nothing is committed here; the caller owns the
    /// transaction boundary.
    pub async fn flush(&mut self, tx: &mut Transaction<'static, Postgres>) -> Result<(), UowError> {
        for tracked in &mut self.tracked {
            match tracked.state {
                EntityState::Unchanged => {},
                EntityState::Added => {
                    tracked.entity.insert(&mut **tx).await?;
                    tracked.current = tracked.entity.values()?;
                },
                EntityState::Modified => tracked.entity.update(&mut **tx).await?,
                EntityState::Deleted => tracked.entity.delete(&mut **tx).await?,
            }
        }
        Ok(())
    }

    /// Number of tracked entities (all states).
    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Serialize;
    use sqlx::PgConnection;

    #[derive(Debug, Clone, Serialize)]
    struct Specimen {
        id: Uuid,
        label: String,
        volume_ml: i32,
    }

    #[async_trait]
    impl TrackedEntity for Specimen {
        fn kind(&self) -> EntityKind {
            EntityKind::TestOrder
        }

        fn entity_id(&self) -> Option<Uuid> {
            Some(self.id)
        }

        fn values(&self) -> Result<Map<String, Value>, serde_json::Error> {
            snapshot_values(self)
        }

        async fn insert(&mut self, _conn: &mut PgConnection) -> Result<(), UowError> {
            Ok(())
        }

        async fn update(&self, _conn: &mut PgConnection) -> Result<(), UowError> {
            Ok(())
        }

        async fn delete(&self, _conn: &mut PgConnection) -> Result<(), UowError> {
            Ok(())
        }
    }

    fn sample() -> Specimen {
        Specimen {
            id: Uuid::new_v4(),
            label: "blood".to_string(),
            volume_ml: 5,
        }
    }

    fn uow() -> UnitOfWork {
        // Creating even a lazy pool needs a Tokio context; no connection is
        // ever opened, tracking is purely in-memory.
        UnitOfWork::new(PgPool::connect_lazy("postgres://localhost/unused").unwrap())
    }

    #[tokio::test]
    async fn loaded_entity_starts_unchanged() {
        let mut uow = uow();
        let key = uow.track_loaded(sample()).unwrap();
        uow.detect_changes().unwrap();

        let snaps = uow.tracked_of_kind(EntityKind::TestOrder);
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].key, key);
        assert_eq!(snaps[0].state, EntityState::Unchanged);
        assert!(snaps[0].dirty_fields().is_empty());
    }

    #[tokio::test]
    async fn staged_mutation_promotes_to_modified() {
        let mut uow = uow();
        let specimen = sample();
        let key = uow.track_loaded(specimen.clone()).unwrap();

        let mut mutated = specimen;
        mutated.label = "plasma".to_string();
        mutated.volume_ml = 10;
        uow.stage(key, mutated).unwrap();
        uow.detect_changes().unwrap();

        let snaps = uow.tracked_of_kind(EntityKind::TestOrder);
        assert_eq!(snaps[0].state, EntityState::Modified);
        assert_eq!(snaps[0].dirty_fields(), vec!["label", "volume_ml"]);
    }

    #[tokio::test]
    async fn staging_original_values_reverts_to_unchanged() {
        let mut uow = uow();
        let specimen = sample();
        let key = uow.track_loaded(specimen.clone()).unwrap();

        let mut mutated = specimen.clone();
        mutated.volume_ml = 9;
        uow.stage(key, mutated).unwrap();
        uow.detect_changes().unwrap();
        assert_eq!(
            uow.tracked_of_kind(EntityKind::TestOrder)[0].state,
            EntityState::Modified
        );

        uow.stage(key, specimen).unwrap();
        uow.detect_changes().unwrap();
        assert_eq!(
            uow.tracked_of_kind(EntityKind::TestOrder)[0].state,
            EntityState::Unchanged
        );
    }

    #[tokio::test]
    async fn added_entity_has_no_original_snapshot() {
        let mut uow = uow();
        uow.track_added(sample()).unwrap();
        uow.detect_changes().unwrap();

        let snaps = uow.tracked_of_kind(EntityKind::TestOrder);
        assert_eq!(snaps[0].state, EntityState::Added);
        assert!(snaps[0].original.is_none());
        assert!(snaps[0].dirty_fields().is_empty());
        assert!(snaps[0].current.contains_key("id"));
    }

    #[tokio::test]
    async fn mark_deleted_is_terminal() {
        let mut uow = uow();
        let key = uow.track_loaded(sample()).unwrap();
        uow.mark_deleted(key).unwrap();
        uow.detect_changes().unwrap();

        assert_eq!(
            uow.tracked_of_kind(EntityKind::TestOrder)[0].state,
            EntityState::Deleted
        );
    }

    #[tokio::test]
    async fn stage_with_unknown_key_fails() {
        let mut uow = uow();
        uow.track_loaded(sample()).unwrap();

        let bogus = TrackKey::new();
        let err = uow.stage(bogus, sample()).unwrap_err();
        assert!(matches!(err, UowError::UnknownKey(k) if k == bogus));
    }
}
