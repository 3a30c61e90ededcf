//! Read operations for patients

pub mod get;
pub mod list;

pub use get::{GetPatientError, GetPatientQuery, GetPatientResponse};
pub use list::{ListPatientsError, ListPatientsQuery, ListPatientsResponse};
