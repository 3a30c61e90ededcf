//! Medical record API routes
//!
//! - `POST /api/v1/medical-records` - Open a record
//! - `GET /api/v1/medical-records` - List records with pagination and filters
//! - `GET /api/v1/medical-records/:id` - Get a single record
//! - `PUT /api/v1/medical-records/:id` - Update a record
//! - `DELETE /api/v1/medical-records/:id` - Delete a record
//!
//! Every write goes through the audit behavior; a version conflict inside
//! the transaction maps to `409 Conflict`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::uow::UowError;

use super::commands::{
    CreateMedicalRecordCommand, CreateMedicalRecordError, DeleteMedicalRecordCommand,
    DeleteMedicalRecordError, UpdateMedicalRecordCommand, UpdateMedicalRecordError,
};
use super::queries::{
    GetMedicalRecordError, GetMedicalRecordQuery, ListMedicalRecordsError,
    ListMedicalRecordsQuery,
};

/// Creates the medical records router with all routes configured
pub fn medical_records_routes() -> Router<PgPool> {
    Router::new()
        .route("/", post(create_record))
        .route("/", get(list_records))
        .route("/:id", get(get_record))
        .route("/:id", put(update_record))
        .route("/:id", delete(delete_record))
}

#[tracing::instrument(skip(pool, command), fields(patient_id = %command.patient_id))]
async fn create_record(
    State(pool): State<PgPool>,
    Json(command): Json<CreateMedicalRecordCommand>,
) -> Result<Response, MedicalRecordApiError> {
    let response = super::commands::create::handle(pool, command).await?;

    tracing::info!(record_id = %response.id, "Medical record created via API");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug, serde::Deserialize)]
struct UpdateRecordBody {
    diagnosis: Option<String>,
    notes: Option<String>,
    status: Option<String>,
    performed_by: Uuid,
}

#[tracing::instrument(skip(pool, body), fields(record_id = %id))]
async fn update_record(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRecordBody>,
) -> Result<Response, MedicalRecordApiError> {
    let command = UpdateMedicalRecordCommand {
        id,
        diagnosis: body.diagnosis,
        notes: body.notes,
        status: body.status,
        performed_by: body.performed_by,
    };

    let response = super::commands::update::handle(pool, command).await?;

    tracing::info!(record_id = %response.id, version = response.version, "Medical record updated via API");
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug, serde::Deserialize)]
struct DeleteRecordBody {
    performed_by: Uuid,
}

#[tracing::instrument(skip(pool, body), fields(record_id = %id))]
async fn delete_record(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(body): Json<DeleteRecordBody>,
) -> Result<Response, MedicalRecordApiError> {
    let command = DeleteMedicalRecordCommand {
        id,
        performed_by: body.performed_by,
    };

    let response = super::commands::delete::handle(pool, command).await?;

    tracing::info!(record_id = %response.id, "Medical record deleted via API");
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool), fields(record_id = %id))]
async fn get_record(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, MedicalRecordApiError> {
    let response = super::queries::get::handle(pool, GetMedicalRecordQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool, query))]
async fn list_records(
    State(pool): State<PgPool>,
    Query(query): Query<ListMedicalRecordsQuery>,
) -> Result<Response, MedicalRecordApiError> {
    let response = super::queries::list::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Mapping
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum MedicalRecordApiError {
    #[error(transparent)]
    Create(#[from] CreateMedicalRecordError),
    #[error(transparent)]
    Update(#[from] UpdateMedicalRecordError),
    #[error(transparent)]
    Delete(#[from] DeleteMedicalRecordError),
    #[error(transparent)]
    Get(#[from] GetMedicalRecordError),
    #[error(transparent)]
    List(#[from] ListMedicalRecordsError),
}

impl IntoResponse for MedicalRecordApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Create(CreateMedicalRecordError::DiagnosisInvalid)
            | Self::Update(UpdateMedicalRecordError::NoFieldsToUpdate)
            | Self::Update(UpdateMedicalRecordError::DiagnosisInvalid)
            | Self::Update(UpdateMedicalRecordError::StatusInvalid)
            | Self::List(ListMedicalRecordsError::InvalidPagination(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },

            Self::Create(CreateMedicalRecordError::PatientNotFound(_))
            | Self::Update(UpdateMedicalRecordError::NotFound(_))
            | Self::Delete(DeleteMedicalRecordError::NotFound(_))
            | Self::Get(GetMedicalRecordError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },

            Self::Update(UpdateMedicalRecordError::Uow(UowError::Conflict { .. }))
            | Self::Delete(DeleteMedicalRecordError::Uow(UowError::Conflict { .. })) => {
                (StatusCode::CONFLICT, "VERSION_CONFLICT")
            },

            Self::Create(CreateMedicalRecordError::Uow(_))
            | Self::Create(CreateMedicalRecordError::Database(_))
            | Self::Update(UpdateMedicalRecordError::Uow(_))
            | Self::Update(UpdateMedicalRecordError::Database(_))
            | Self::Delete(DeleteMedicalRecordError::Uow(_))
            | Self::Delete(DeleteMedicalRecordError::Database(_))
            | Self::Get(GetMedicalRecordError::Database(_))
            | Self::List(ListMedicalRecordsError::Database(_)) => {
                tracing::error!("Medical record request failed: {}", self);
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
