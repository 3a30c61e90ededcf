//! OpenLIMS Server Library
//!
//! HTTP server for laboratory identity and patient test-order management.
//!
//! # Overview
//!
//! The server exposes a REST API for two service areas:
//!
//! - **Identity**: laboratory staff accounts and roles
//! - **Lab**: patients, medical records, and test orders
//!
//! # Architecture
//!
//! The server follows a **CQRS (Command Query Responsibility Segregation)**
//! architecture:
//!
//! - **Commands** (Write Operations): Create, Update, Delete operations that
//!   modify state. Commands against audited entities run inside
//!   [`audit::AuditBehavior`], which diffs entity snapshots around the handler
//!   and persists the business mutation together with its audit rows in a
//!   single transaction.
//! - **Queries** (Read Operations): Retrieve operations that read state. Not
//!   audited to reduce noise and improve performance.
//!
//! ## Audit Logging
//!
//! Audited commands record:
//! - Action performed (create, update, delete)
//! - Entity kind and ID
//! - The acting user
//! - Field-level changes (JSON diff)
//! - Timestamp
//!
//! Query the audit trail via `/api/v1/audit`.
//!
//! ## Framework Stack
//!
//! - **Axum**: Modern, ergonomic web framework
//! - **SQLx**: Async PostgreSQL driver and migrations
//! - **Mediator**: Command/query dispatch
//! - **Tower**: Middleware and service abstractions
//!
//! # Example
//!
//! ```no_run
//! use lims_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod audit;
pub mod config;
pub mod cqrs;
pub mod features;
pub mod middleware;
pub mod uow;
