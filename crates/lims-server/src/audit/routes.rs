//! Audit trail API routes (read-only)
//!
//! - `GET /api/v1/audit` - Query audit logs with filters
//! - `GET /api/v1/audit/:entity_kind/:entity_id` - One entity's trail

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::uow::EntityKind;

use super::models::AuditQuery;
use super::store;

/// Creates the audit router with all routes configured
pub fn audit_routes() -> Router<PgPool> {
    Router::new()
        .route("/", get(query_logs))
        .route("/:entity_kind/:entity_id", get(entity_trail))
}

#[tracing::instrument(skip(pool, query))]
async fn query_logs(
    State(pool): State<PgPool>,
    Query(query): Query<AuditQuery>,
) -> Result<Response, AuditApiError> {
    let rows = store::query_audit_logs(&pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))).into_response())
}

#[derive(Debug, Deserialize)]
struct TrailParams {
    limit: Option<i64>,
}

#[tracing::instrument(skip(pool))]
async fn entity_trail(
    State(pool): State<PgPool>,
    Path((entity_kind, entity_id)): Path<(String, Uuid)>,
    Query(params): Query<TrailParams>,
) -> Result<Response, AuditApiError> {
    let kind = parse_kind(&entity_kind).ok_or(AuditApiError::UnknownKind(entity_kind))?;
    let rows = store::entity_audit_trail(&pool, kind, entity_id, params.limit).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))).into_response())
}

fn parse_kind(value: &str) -> Option<EntityKind> {
    match value {
        "user" => Some(EntityKind::User),
        "patient" => Some(EntityKind::Patient),
        "medical_record" => Some(EntityKind::MedicalRecord),
        "test_order" => Some(EntityKind::TestOrder),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
enum AuditApiError {
    #[error("Unknown entity kind '{0}'")]
    UnknownKind(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AuditApiError {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownKind(_) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            Self::Database(_) => {
                tracing::error!("Audit query failed: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("medical_record"), Some(EntityKind::MedicalRecord));
        assert_eq!(parse_kind("test_order"), Some(EntityKind::TestOrder));
        assert_eq!(parse_kind("specimen"), None);
    }
}
