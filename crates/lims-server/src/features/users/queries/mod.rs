//! Read operations for users

pub mod get;
pub mod list;

pub use get::{GetUserError, GetUserQuery, GetUserResponse};
pub use list::{ListUsersError, ListUsersQuery, ListUsersResponse};
