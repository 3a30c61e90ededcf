//! Medical records feature
//!
//! Audited CRUD for patient medical records. Every write runs under the
//! audit behavior with the paired old/new payload shape, and carries an
//! optimistic-concurrency version token.

pub mod commands;
pub mod entity;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateMedicalRecordCommand, CreateMedicalRecordError, CreateMedicalRecordResponse,
    DeleteMedicalRecordCommand, DeleteMedicalRecordError, DeleteMedicalRecordResponse,
    UpdateMedicalRecordCommand, UpdateMedicalRecordError, UpdateMedicalRecordResponse,
};
pub use entity::{find_medical_record, MedicalRecord, RECORD_STATUSES};
pub use queries::{
    GetMedicalRecordError, GetMedicalRecordQuery, GetMedicalRecordResponse,
    ListMedicalRecordsError, ListMedicalRecordsQuery, ListMedicalRecordsResponse,
    MedicalRecordListItem,
};
pub use routes::medical_records_routes;
