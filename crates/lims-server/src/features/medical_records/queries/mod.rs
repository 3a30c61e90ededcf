//! Read operations for medical records

pub mod get;
pub mod list;

pub use get::{GetMedicalRecordError, GetMedicalRecordQuery, GetMedicalRecordResponse};
pub use list::{
    ListMedicalRecordsError, ListMedicalRecordsQuery, ListMedicalRecordsResponse,
    MedicalRecordListItem,
};
