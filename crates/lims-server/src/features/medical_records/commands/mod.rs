//! Write operations for medical records

pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateMedicalRecordCommand, CreateMedicalRecordError, CreateMedicalRecordResponse};
pub use delete::{DeleteMedicalRecordCommand, DeleteMedicalRecordError, DeleteMedicalRecordResponse};
pub use update::{UpdateMedicalRecordCommand, UpdateMedicalRecordError, UpdateMedicalRecordResponse};
