//! Patients feature
//!
//! Patient registry for the lab domain. Not a watched entity type: writes
//! here bypass the audit behavior entirely.

pub mod commands;
pub mod model;
pub mod queries;
pub mod routes;

pub use commands::{CreatePatientCommand, CreatePatientError, CreatePatientResponse};
pub use model::{find_patient, patient_exists, Patient};
pub use queries::{
    GetPatientError, GetPatientQuery, GetPatientResponse, ListPatientsError, ListPatientsQuery,
    ListPatientsResponse,
};
pub use routes::patients_routes;
