//! OpenLIMS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the OpenLIMS workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: Tracing subscriber setup with environment-based configuration
//!
//! # Example
//!
//! ```no_run
//! use lims_common::{Result, LimsError};
//! use lims_common::logging::{LogConfig, init_logging};
//!
//! fn start() -> Result<()> {
//!     let config = LogConfig::from_env().map_err(|e| LimsError::Config(e.to_string()))?;
//!     init_logging(&config).map_err(|e| LimsError::Config(e.to_string()))?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{LimsError, Result};
