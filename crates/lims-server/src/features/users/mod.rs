//! Users feature
//!
//! Identity-side user accounts. The `performed_by` id on audit rows refers
//! to these users, but the users table itself is not a watched entity type.

pub mod commands;
pub mod model;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateUserCommand, CreateUserError, CreateUserResponse, DeleteUserCommand, DeleteUserError,
    DeleteUserResponse, UpdateUserCommand, UpdateUserError, UpdateUserResponse,
};
pub use model::{find_user, User, USER_ROLES};
pub use queries::{
    GetUserError, GetUserQuery, GetUserResponse, ListUsersError, ListUsersQuery, ListUsersResponse,
};
pub use routes::users_routes;
