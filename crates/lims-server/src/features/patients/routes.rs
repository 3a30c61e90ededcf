//! Patient API routes
//!
//! - `POST /api/v1/patients` - Register a patient
//! - `GET /api/v1/patients` - List patients with search and pagination
//! - `GET /api/v1/patients/:id` - Get a single patient

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};

use super::commands::{CreatePatientCommand, CreatePatientError};
use super::queries::{GetPatientError, GetPatientQuery, ListPatientsError, ListPatientsQuery};

/// Creates the patients router with all routes configured
pub fn patients_routes() -> Router<PgPool> {
    Router::new()
        .route("/", post(create_patient))
        .route("/", get(list_patients))
        .route("/:id", get(get_patient))
}

#[tracing::instrument(skip(pool, command), fields(mrn = %command.mrn))]
async fn create_patient(
    State(pool): State<PgPool>,
    Json(command): Json<CreatePatientCommand>,
) -> Result<Response, PatientApiError> {
    let response = super::commands::create::handle(pool, command).await?;

    tracing::info!(patient_id = %response.id, "Patient registered via API");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool), fields(patient_id = %id))]
async fn get_patient(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, PatientApiError> {
    let response = super::queries::get::handle(pool, GetPatientQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool, query))]
async fn list_patients(
    State(pool): State<PgPool>,
    Query(query): Query<ListPatientsQuery>,
) -> Result<Response, PatientApiError> {
    let response = super::queries::list::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Mapping
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum PatientApiError {
    #[error(transparent)]
    Create(#[from] CreatePatientError),
    #[error(transparent)]
    Get(#[from] GetPatientError),
    #[error(transparent)]
    List(#[from] ListPatientsError),
}

impl IntoResponse for PatientApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Create(CreatePatientError::MrnInvalid)
            | Self::Create(CreatePatientError::NameInvalid)
            | Self::List(ListPatientsError::InvalidPagination(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            Self::Create(CreatePatientError::DuplicateMrn(_)) => {
                (StatusCode::CONFLICT, "CONFLICT")
            },
            Self::Get(GetPatientError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Create(CreatePatientError::Database(_))
            | Self::Get(GetPatientError::Database(_))
            | Self::List(ListPatientsError::Database(_)) => {
                tracing::error!("Patient request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            },
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "A database error occurred".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
