//! Create user command

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::validation::{validate_email, validate_length, validate_one_of};

use super::super::model::USER_ROLES;

/// Command to create a new user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserCommand {
    pub email: String,
    pub full_name: String,
    /// Defaults to `technician` when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Response from creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur when creating a user
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    /// Email is structurally invalid or exceeds 256 characters
    #[error("Email address is invalid")]
    EmailInvalid,
    /// Full name was empty or exceeds 256 characters
    #[error("Full name is required and must be at most 256 characters")]
    NameInvalid,
    /// Role is not one of the allowed values
    #[error("Role must be one of: admin, physician, technician")]
    RoleInvalid,
    /// A user with this email already exists
    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CreateUserResponse, CreateUserError>> for CreateUserCommand {}

impl CreateUserCommand {
    pub fn validate(&self) -> Result<(), CreateUserError> {
        if !validate_length(&self.email, 256) || !validate_email(&self.email) {
            return Err(CreateUserError::EmailInvalid);
        }
        if !validate_length(&self.full_name, 256) {
            return Err(CreateUserError::NameInvalid);
        }
        if let Some(ref role) = self.role {
            if !validate_one_of(role, USER_ROLES) {
                return Err(CreateUserError::RoleInvalid);
            }
        }
        Ok(())
    }
}

/// Handles the create user command
#[tracing::instrument(skip(pool, command), fields(email = %command.email))]
pub async fn handle(
    pool: PgPool,
    command: CreateUserCommand,
) -> Result<CreateUserResponse, CreateUserError> {
    command.validate()?;

    if super::super::model::email_taken(&pool, &command.email).await? {
        return Err(CreateUserError::DuplicateEmail(command.email));
    }

    let id = Uuid::new_v4();
    let role = command
        .role
        .unwrap_or_else(|| "technician".to_string());
    let row: (DateTime<Utc>,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, full_name, role, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING created_at
        "#,
    )
    .bind(id)
    .bind(&command.email)
    .bind(&command.full_name)
    .bind(&role)
    .fetch_one(&pool)
    .await?;

    tracing::info!(user_id = %id, role = %role, "User created");

    Ok(CreateUserResponse {
        id,
        email: command.email,
        full_name: command.full_name,
        role,
        is_active: true,
        created_at: row.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> CreateUserCommand {
        CreateUserCommand {
            email: "tech@lab.example.org".to_string(),
            full_name: "Test Technician".to_string(),
            role: None,
        }
    }

    #[test]
    fn test_validation_rejects_bad_email() {
        let mut cmd = command();
        cmd.email = "not-an-email".to_string();
        assert!(matches!(cmd.validate(), Err(CreateUserError::EmailInvalid)));
    }

    #[test]
    fn test_validation_rejects_unknown_role() {
        let mut cmd = command();
        cmd.role = Some("superuser".to_string());
        assert!(matches!(cmd.validate(), Err(CreateUserError::RoleInvalid)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_defaults_role(pool: PgPool) -> sqlx::Result<()> {
        let response = handle(pool.clone(), command()).await.unwrap();
        assert_eq!(response.role, "technician");
        assert!(response.is_active);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_duplicate_email(pool: PgPool) -> sqlx::Result<()> {
        handle(pool.clone(), command()).await.unwrap();
        let result = handle(pool.clone(), command()).await;
        assert!(matches!(result, Err(CreateUserError::DuplicateEmail(_))));
        Ok(())
    }
}
