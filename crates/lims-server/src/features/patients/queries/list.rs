//! List patients query
//!
//! Paginated listing with an optional case-insensitive MRN or name search.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::pagination::{Paginated, PaginationParams};

use super::super::model::Patient;

/// Query to list patients
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListPatientsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    /// Matches against MRN, first name, or last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

pub type ListPatientsResponse = Paginated<Patient>;

/// Errors that can occur when listing patients
#[derive(Debug, thiserror::Error)]
pub enum ListPatientsError {
    #[error("Invalid pagination: {0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ListPatientsResponse, ListPatientsError>> for ListPatientsQuery {}

#[tracing::instrument(skip(pool, query))]
pub async fn handle(
    pool: PgPool,
    query: ListPatientsQuery,
) -> Result<ListPatientsResponse, ListPatientsError> {
    query
        .pagination
        .validate()
        .map_err(ListPatientsError::InvalidPagination)?;

    let pattern = query.search.as_ref().map(|s| format!("%{}%", s));

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM patients
        WHERE ($1::varchar IS NULL
               OR mrn ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1)
        "#,
    )
    .bind(&pattern)
    .fetch_one(&pool)
    .await?;

    let items = sqlx::query_as::<_, Patient>(
        r#"
        SELECT id, mrn, first_name, last_name, date_of_birth, created_at
        FROM patients
        WHERE ($1::varchar IS NULL
               OR mrn ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1)
        ORDER BY last_name, first_name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&pattern)
    .bind(query.pagination.per_page())
    .bind(query.pagination.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Paginated::from_items(items, &query.pagination, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestPatient;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_searches_by_mrn_and_name(pool: PgPool) -> sqlx::Result<()> {
        TestPatient::new("MRN-0301")
            .with_name("Grace", "Hopper")
            .insert(&pool)
            .await?;
        TestPatient::new("MRN-0302")
            .with_name("Ada", "Lovelace")
            .insert(&pool)
            .await?;

        let query = ListPatientsQuery {
            search: Some("hopper".to_string()),
            ..Default::default()
        };
        let response = handle(pool.clone(), query).await.unwrap();
        assert_eq!(response.pagination.total, 1);
        assert_eq!(response.items[0].mrn, "MRN-0301");
        Ok(())
    }
}
