//! Audit logging core
//!
//! Cross-cutting, diff-based audit trail for the watched entity types
//! (medical records and test orders). Commands opt in by implementing
//! [`AuditableCommand`]; their handlers run inside an [`AuditBehavior`] that
//! snapshots tracked entity state before and after the handler and commits
//! the business mutation together with the generated audit rows in a single
//! transaction.
//!
//! # Protocol
//!
//! 1. Pre-handler: detect changes, capture an [`AuditEntry`] per dirty
//!    tracked entity of the watched kind.
//! 2. Handler runs, mutating entities through the shared
//!    [`UnitOfWork`](crate::uow::UnitOfWork). It must not commit.
//! 3. Post-handler, inside one transaction: re-detect changes, merge the
//!    snapshots by correlation key, flush business mutations, insert one
//!    audit row per entry, commit. Any failure rolls the whole transaction
//!    back.
//!
//! An audit row exists if and only if the business mutation it describes
//! committed in the same transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use lims_server::audit::AuditBehavior;
//! use lims_server::uow::UnitOfWork;
//!
//! let behavior = AuditBehavior::test_orders();
//! let mut uow = UnitOfWork::new(pool.clone());
//! let response = behavior
//!     .execute(&mut uow, &command, |uow| {
//!         let command = command.clone();
//!         Box::pin(async move { handle_inner(uow, command).await })
//!     })
//!     .await?;
//! ```

mod behavior;
mod entry;
mod models;
mod payload;
pub mod routes;
mod store;

pub use behavior::{AuditBehavior, AuditableCommand, HandlerFuture};
pub use entry::AuditEntry;
pub use models::{AuditAction, AuditLogRow, AuditQuery, NewAuditLog};
pub use payload::{ChangePayload, PayloadShape};
pub use routes::audit_routes;
pub use store::{entity_audit_trail, insert_audit_rows, query_audit_logs};
