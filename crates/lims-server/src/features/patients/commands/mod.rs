//! Write operations for patients

pub mod create;

pub use create::{CreatePatientCommand, CreatePatientError, CreatePatientResponse};
