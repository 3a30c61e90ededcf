//! Shared utilities for feature modules
//!
//! - **pagination**: Common pagination types for list queries
//! - **validation**: Input validation helpers
//! - **test_helpers**: Fixtures for integration tests (test-only)

pub mod pagination;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use pagination::{Paginated, PaginationMetadata, PaginationParams};
pub use validation::{validate_length, validate_one_of};
