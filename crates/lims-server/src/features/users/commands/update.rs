//! Update user command
//!
//! Partial update of name, role, and active flag. Email is fixed at
//! creation; deactivation is preferred over deletion for accounts that
//! appear in audit rows.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::validation::{validate_length, validate_one_of};

use super::super::model::{find_user, USER_ROLES};

/// Command to update an existing user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserCommand {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Response from updating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur when updating a user
#[derive(Debug, thiserror::Error)]
pub enum UpdateUserError {
    /// No fields were provided for update
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    /// Full name was empty or exceeds 256 characters
    #[error("Full name must be non-empty and at most 256 characters")]
    NameInvalid,
    /// Role is not one of the allowed values
    #[error("Role must be one of: admin, physician, technician")]
    RoleInvalid,
    /// No user with the given id exists
    #[error("User {0} not found")]
    NotFound(Uuid),
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<UpdateUserResponse, UpdateUserError>> for UpdateUserCommand {}

impl UpdateUserCommand {
    pub fn validate(&self) -> Result<(), UpdateUserError> {
        if self.full_name.is_none() && self.role.is_none() && self.is_active.is_none() {
            return Err(UpdateUserError::NoFieldsToUpdate);
        }
        if let Some(ref name) = self.full_name {
            if !validate_length(name, 256) {
                return Err(UpdateUserError::NameInvalid);
            }
        }
        if let Some(ref role) = self.role {
            if !validate_one_of(role, USER_ROLES) {
                return Err(UpdateUserError::RoleInvalid);
            }
        }
        Ok(())
    }
}

/// Handles the update user command
#[tracing::instrument(skip(pool, command), fields(user_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: UpdateUserCommand,
) -> Result<UpdateUserResponse, UpdateUserError> {
    command.validate()?;

    let user = find_user(&pool, command.id)
        .await?
        .ok_or(UpdateUserError::NotFound(command.id))?;

    let full_name = command.full_name.unwrap_or(user.full_name);
    let role = command.role.unwrap_or(user.role);
    let is_active = command.is_active.unwrap_or(user.is_active);

    let row: (DateTime<Utc>,) = sqlx::query_as(
        r#"
        UPDATE users
        SET full_name = $2, role = $3, is_active = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING updated_at
        "#,
    )
    .bind(command.id)
    .bind(&full_name)
    .bind(&role)
    .bind(is_active)
    .fetch_one(&pool)
    .await?;

    tracing::info!(user_id = %command.id, "User updated");

    Ok(UpdateUserResponse {
        id: command.id,
        email: user.email,
        full_name,
        role,
        is_active,
        updated_at: row.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::TestUser;

    #[test]
    fn test_validation_requires_a_field() {
        let cmd = UpdateUserCommand {
            id: Uuid::new_v4(),
            full_name: None,
            role: None,
            is_active: None,
        };
        assert!(matches!(cmd.validate(), Err(UpdateUserError::NoFieldsToUpdate)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_deactivates_user(pool: PgPool) -> sqlx::Result<()> {
        let user = TestUser::new("tech@lab.example.org").insert(&pool).await?;

        let cmd = UpdateUserCommand {
            id: user.id,
            full_name: None,
            role: None,
            is_active: Some(false),
        };
        let response = handle(pool.clone(), cmd).await.unwrap();
        assert!(!response.is_active);
        assert_eq!(response.email, "tech@lab.example.org");
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_handle_missing_user(pool: PgPool) -> sqlx::Result<()> {
        let cmd = UpdateUserCommand {
            id: Uuid::new_v4(),
            full_name: Some("Nobody".to_string()),
            role: None,
            is_active: None,
        };
        let result = handle(pool.clone(), cmd).await;
        assert!(matches!(result, Err(UpdateUserError::NotFound(_))));
        Ok(())
    }
}
