//! Test order API routes
//!
//! - `POST /api/v1/test-orders` - Place an order
//! - `GET /api/v1/test-orders` - List orders with pagination and filters
//! - `GET /api/v1/test-orders/:id` - Get a single order
//! - `PUT /api/v1/test-orders/:id` - Update an order
//! - `DELETE /api/v1/test-orders/:id` - Delete an order

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

use super::commands::{
    CreateTestOrderCommand, CreateTestOrderError, DeleteTestOrderCommand, DeleteTestOrderError,
    UpdateTestOrderCommand, UpdateTestOrderError,
};
use super::queries::{
    GetTestOrderError, GetTestOrderQuery, ListTestOrdersError, ListTestOrdersQuery,
};

/// Creates the test orders router with all routes configured
pub fn test_orders_routes() -> Router<PgPool> {
    Router::new()
        .route("/", post(create_order))
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id", put(update_order))
        .route("/:id", delete(delete_order))
}

#[tracing::instrument(skip(pool, command), fields(patient_id = %command.patient_id))]
async fn create_order(
    State(pool): State<PgPool>,
    Json(command): Json<CreateTestOrderCommand>,
) -> Result<Response, TestOrderApiError> {
    let response = super::commands::create::handle(pool, command).await?;

    tracing::info!(order_id = %response.id, "Test order placed via API");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug, serde::Deserialize)]
struct UpdateOrderBody {
    priority: Option<String>,
    status: Option<String>,
    result_value: Option<String>,
    performed_by: Uuid,
}

#[tracing::instrument(skip(pool, body), fields(order_id = %id))]
async fn update_order(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderBody>,
) -> Result<Response, TestOrderApiError> {
    let command = UpdateTestOrderCommand {
        id,
        priority: body.priority,
        status: body.status,
        result_value: body.result_value,
        performed_by: body.performed_by,
    };

    let response = super::commands::update::handle(pool, command).await?;

    tracing::info!(order_id = %response.id, status = %response.status, "Test order updated via API");
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug, serde::Deserialize)]
struct DeleteOrderBody {
    performed_by: Uuid,
}

#[tracing::instrument(skip(pool, body), fields(order_id = %id))]
async fn delete_order(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(body): Json<DeleteOrderBody>,
) -> Result<Response, TestOrderApiError> {
    let command = DeleteTestOrderCommand {
        id,
        performed_by: body.performed_by,
    };

    let response = super::commands::delete::handle(pool, command).await?;

    tracing::info!(order_id = %response.id, "Test order deleted via API");
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool), fields(order_id = %id))]
async fn get_order(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, TestOrderApiError> {
    let response = super::queries::get::handle(pool, GetTestOrderQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool, query))]
async fn list_orders(
    State(pool): State<PgPool>,
    Query(query): Query<ListTestOrdersQuery>,
) -> Result<Response, TestOrderApiError> {
    let response = super::queries::list::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Mapping
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum TestOrderApiError {
    #[error(transparent)]
    Create(#[from] CreateTestOrderError),
    #[error(transparent)]
    Update(#[from] UpdateTestOrderError),
    #[error(transparent)]
    Delete(#[from] DeleteTestOrderError),
    #[error(transparent)]
    Get(#[from] GetTestOrderError),
    #[error(transparent)]
    List(#[from] ListTestOrdersError),
}

impl IntoResponse for TestOrderApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Create(CreateTestOrderError::TestTypeInvalid)
            | Self::Create(CreateTestOrderError::PriorityInvalid)
            | Self::Update(UpdateTestOrderError::NoFieldsToUpdate)
            | Self::Update(UpdateTestOrderError::PriorityInvalid)
            | Self::Update(UpdateTestOrderError::StatusInvalid)
            | Self::Update(UpdateTestOrderError::ResultInvalid)
            | Self::List(ListTestOrdersError::InvalidPagination(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },

            Self::Create(CreateTestOrderError::PatientNotFound(_))
            | Self::Update(UpdateTestOrderError::NotFound(_))
            | Self::Delete(DeleteTestOrderError::NotFound(_))
            | Self::Get(GetTestOrderError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),

            Self::Delete(DeleteTestOrderError::Completed(_)) => {
                (StatusCode::CONFLICT, "ORDER_COMPLETED")
            },

            Self::Create(CreateTestOrderError::Uow(_))
            | Self::Create(CreateTestOrderError::Database(_))
            | Self::Update(UpdateTestOrderError::Uow(_))
            | Self::Update(UpdateTestOrderError::Database(_))
            | Self::Delete(DeleteTestOrderError::Uow(_))
            | Self::Delete(DeleteTestOrderError::Database(_))
            | Self::Get(GetTestOrderError::Database(_))
            | Self::List(ListTestOrdersError::Database(_)) => {
                tracing::error!("Test order request failed: {}", self);
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
