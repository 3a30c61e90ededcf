//! The audit behavior: a decorator wrapped around auditable command handlers
//!
//! For every auditable command the behavior snapshots the tracked entities of
//! its watched kind before the handler runs, re-diffs them afterwards, and
//! persists the business mutations together with the generated audit rows in
//! one transaction. The wrapped handler mutates entities through the shared
//! [`UnitOfWork`] and never commits on its own.
//!
//! Commands that do not implement [`AuditableCommand`] are simply never
//! routed through a behavior; their handlers run bare.
//!
//! Error contract: handler errors are logged and re-thrown before any
//! transaction exists; failures inside the transaction (including optimistic
//! concurrency conflicts raised by the flush) roll everything back and
//! propagate. Success means the business rows and the audit rows are durable
//! together; any failure means neither is. If the request future is dropped
//! mid-transaction, sqlx rolls the open transaction back when it is dropped.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use sqlx::{Postgres, Transaction};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::uow::{EntityKind, EntityState, UnitOfWork, UowError};

use super::entry::AuditEntry;
use super::models::{AuditAction, NewAuditLog};
use super::payload::PayloadShape;
use super::store;

/// Boxed future returned by a wrapped command handler
pub type HandlerFuture<'a, R, E> = Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'a>>;

/// Capability a command type implements to opt into auditing
///
/// Non-implementing commands never pay the two-snapshot cost: the dispatch
/// code only wraps handlers of commands carrying this trait.
pub trait AuditableCommand {
    /// Identity of the acting user.
    fn performed_by(&self) -> Uuid;

    /// Semantic label for the operation, used in structured logs.
    fn audit_action(&self) -> AuditAction;

    /// Target entity id, when the command already knows it.
    fn target_id(&self) -> Option<Uuid> {
        None
    }
}

/// Audit decorator for one watched entity kind
///
/// One instance exists per watched type; instances differ only in the kind
/// they enumerate and the payload shape they serialize.
#[derive(Debug, Clone, Copy)]
pub struct AuditBehavior {
    watched: EntityKind,
    shape: PayloadShape,
}

impl AuditBehavior {
    pub fn new(watched: EntityKind, shape: PayloadShape) -> Self {
        Self { watched, shape }
    }

    /// Behavior watching medical records, serializing old/new pairs.
    pub fn medical_records() -> Self {
        Self::new(EntityKind::MedicalRecord, PayloadShape::PairedOldNew)
    }

    /// Behavior watching test orders, serializing flat field lists.
    pub fn test_orders() -> Self {
        Self::new(EntityKind::TestOrder, PayloadShape::FlatFields)
    }

    /// Run `next` under the two-snapshot audit protocol.
    ///
    /// Pre-snapshot strictly precedes the handler, which strictly precedes
    /// the post-snapshot, which strictly precedes the commit. The business
    /// flush completes before audit rows are inserted so that keys assigned
    /// at insert time are resolved.
    pub async fn execute<C, R, E, F>(
        &self,
        uow: &mut UnitOfWork,
        command: &C,
        next: F,
    ) -> Result<R, E>
    where
        C: AuditableCommand,
        E: From<UowError> + fmt::Display,
        F: for<'a> FnOnce(&'a mut UnitOfWork) -> HandlerFuture<'a, R, E>,
    {
        debug!(
            watched = %self.watched,
            action = %command.audit_action(),
            performed_by = %command.performed_by(),
            target_id = ?command.target_id(),
            "Audit behavior: pre-handler snapshot"
        );

        uow.detect_changes().map_err(E::from)?;
        let mut entries = self.pre_snapshot(uow);

        let response = match next(uow).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    watched = %self.watched,
                    action = %command.audit_action(),
                    error = %err,
                    "Handler failed; no transaction was opened"
                );
                return Err(err);
            },
        };

        uow.detect_changes().map_err(E::from)?;
        self.merge_post_snapshot(uow, &mut entries);
        entries.retain(|entry| entry.action != EntityState::Unchanged);

        let mut tx = uow.begin().await.map_err(E::from)?;
        match self
            .flush_and_log(uow, &mut tx, command.performed_by(), &mut entries)
            .await
        {
            Ok(row_count) => {
                tx.commit().await.map_err(UowError::from).map_err(E::from)?;
                info!(
                    watched = %self.watched,
                    action = %command.audit_action(),
                    audit_rows = row_count,
                    "Business and audit rows committed"
                );
                Ok(response)
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(
                        watched = %self.watched,
                        error = %rollback_err,
                        "Rollback failed after transaction error"
                    );
                }
                warn!(
                    watched = %self.watched,
                    action = %command.audit_action(),
                    error = %err,
                    "Transaction rolled back; neither business nor audit rows persisted"
                );
                Err(E::from(err))
            },
        }
    }

    /// Capture entries for entities of the watched kind already tracked and
    /// dirty before the handler runs. Added entities cannot appear here.
    fn pre_snapshot(&self, uow: &UnitOfWork) -> Vec<AuditEntry> {
        uow.tracked_of_kind(self.watched)
            .iter()
            .filter(|snap| snap.state != EntityState::Unchanged)
            .map(AuditEntry::capture_pre)
            .collect()
    }

    /// Merge the post-handler snapshot into the pre-handler entries,
    /// matching by correlation key. Entities first observed now (added or
    /// deleted by the handler, or loaded and then modified) get fresh
    /// entries; entries whose entity reverted to its original values are
    /// marked unchanged so they drop out.
    fn merge_post_snapshot(&self, uow: &UnitOfWork, entries: &mut Vec<AuditEntry>) {
        for snap in uow.tracked_of_kind(self.watched) {
            if let Some(entry) = entries.iter_mut().find(|e| e.key == snap.key) {
                entry.fill_post(&snap);
            } else if snap.state != EntityState::Unchanged {
                entries.push(AuditEntry::capture_post(&snap));
            }
        }
    }

    /// Steps 4-6 of the post-handler phase, on the open transaction:
    /// flush the business mutations, resolve entity ids, insert audit rows.
    async fn flush_and_log(
        &self,
        uow: &mut UnitOfWork,
        tx: &mut Transaction<'static, Postgres>,
        performed_by: Uuid,
        entries: &mut [AuditEntry],
    ) -> Result<usize, UowError> {
        uow.flush(tx).await?;

        // Keys for added entities exist only after the flush above.
        for entry in entries.iter_mut() {
            if entry.entity_id.is_none() {
                entry.entity_id = uow.entity_id(entry.key);
            }
        }

        let rows: Vec<NewAuditLog> = entries
            .iter()
            .filter_map(|entry| {
                let action = AuditAction::from_state(entry.action)?;
                let payload = self.shape.render(entry);
                Some(NewAuditLog {
                    entity_kind: entry.kind,
                    entity_id: entry.entity_id,
                    action,
                    performed_by,
                    changed_fields: payload.changed_fields,
                    old_values: payload.old_values,
                    new_values: payload.new_values,
                })
            })
            .collect();

        store::insert_audit_rows(&mut **tx, &rows).await?;
        Ok(rows.len())
    }
}
