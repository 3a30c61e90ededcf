//! Feature modules implementing the OpenLIMS API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes, following the CQRS split. Commands and queries implement the
//! mediator pattern via the `mediator` crate.
//!
//! # Features
//!
//! - **users**: identity-side user accounts (not audited)
//! - **patients**: patient registry (not audited)
//! - **medical_records**: audited records with version tokens
//! - **test_orders**: audited lab test orders
//!
//! The audit read API lives in [`crate::audit`] and is mounted here next to
//! the feature routes.

pub mod medical_records;
pub mod patients;
pub mod shared;
pub mod test_orders;
pub mod users;

use axum::Router;
use sqlx::PgPool;

/// Creates the main API router with all feature routes mounted
///
/// Each feature is mounted under its own path prefix:
/// - `/users` - User management
/// - `/patients` - Patient registry
/// - `/medical-records` - Audited medical records
/// - `/test-orders` - Audited lab test orders
/// - `/audit` - Audit trail queries (read-only)
pub fn router(pool: PgPool) -> Router<()> {
    Router::new()
        .nest("/users", users::users_routes().with_state(pool.clone()))
        .nest("/patients", patients::patients_routes().with_state(pool.clone()))
        .nest(
            "/medical-records",
            medical_records::medical_records_routes().with_state(pool.clone()),
        )
        .nest(
            "/test-orders",
            test_orders::test_orders_routes().with_state(pool.clone()),
        )
        .nest("/audit", crate::audit::audit_routes().with_state(pool))
}
