//! User API routes
//!
//! - `POST /api/v1/users` - Create a user
//! - `GET /api/v1/users` - List users with pagination and filters
//! - `GET /api/v1/users/:id` - Get a single user
//! - `PUT /api/v1/users/:id` - Update a user
//! - `DELETE /api/v1/users/:id` - Delete a user

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
    CreateUserCommand, CreateUserError, DeleteUserCommand, DeleteUserError, UpdateUserCommand,
    UpdateUserError,
};
use super::queries::{GetUserError, GetUserQuery, ListUsersError, ListUsersQuery};

/// Creates the users router with all routes configured
pub fn users_routes() -> Router<PgPool> {
    Router::new()
        .route("/", post(create_user))
        .route("/", get(list_users))
        .route("/:id", get(get_user))
        .route("/:id", put(update_user))
        .route("/:id", delete(delete_user))
}

#[tracing::instrument(skip(pool, command), fields(email = %command.email))]
async fn create_user(
    State(pool): State<PgPool>,
    Json(command): Json<CreateUserCommand>,
) -> Result<Response, UserApiError> {
    let response = super::commands::create::handle(pool, command).await?;

    tracing::info!(user_id = %response.id, "User created via API");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug, serde::Deserialize)]
struct UpdateUserBody {
    full_name: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
}

#[tracing::instrument(skip(pool, body), fields(user_id = %id))]
async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserBody>,
) -> Result<Response, UserApiError> {
    let command = UpdateUserCommand {
        id,
        full_name: body.full_name,
        role: body.role,
        is_active: body.is_active,
    };

    let response = super::commands::update::handle(pool, command).await?;

    tracing::info!(user_id = %response.id, "User updated via API");
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool), fields(user_id = %id))]
async fn delete_user(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, UserApiError> {
    let response = super::commands::delete::handle(pool, DeleteUserCommand { id }).await?;

    tracing::info!(user_id = %response.id, "User deleted via API");
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool), fields(user_id = %id))]
async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, UserApiError> {
    let response = super::queries::get::handle(pool, GetUserQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool, query))]
async fn list_users(
    State(pool): State<PgPool>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Response, UserApiError> {
    let response = super::queries::list::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Mapping
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum UserApiError {
    #[error(transparent)]
    Create(#[from] CreateUserError),
    #[error(transparent)]
    Update(#[from] UpdateUserError),
    #[error(transparent)]
    Delete(#[from] DeleteUserError),
    #[error(transparent)]
    Get(#[from] GetUserError),
    #[error(transparent)]
    List(#[from] ListUsersError),
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Create(CreateUserError::EmailInvalid)
            | Self::Create(CreateUserError::NameInvalid)
            | Self::Create(CreateUserError::RoleInvalid)
            | Self::Update(UpdateUserError::NoFieldsToUpdate)
            | Self::Update(UpdateUserError::NameInvalid)
            | Self::Update(UpdateUserError::RoleInvalid)
            | Self::List(ListUsersError::InvalidPagination(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            Self::Create(CreateUserError::DuplicateEmail(_)) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Update(UpdateUserError::NotFound(_))
            | Self::Delete(DeleteUserError::NotFound(_))
            | Self::Get(GetUserError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Create(CreateUserError::Database(_))
            | Self::Update(UpdateUserError::Database(_))
            | Self::Delete(DeleteUserError::Database(_))
            | Self::Get(GetUserError::Database(_))
            | Self::List(ListUsersError::Database(_)) => {
                tracing::error!("User request failed: {}", self);
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
