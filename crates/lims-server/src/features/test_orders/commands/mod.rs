//! Write operations for test orders

pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateTestOrderCommand, CreateTestOrderError, CreateTestOrderResponse};
pub use delete::{DeleteTestOrderCommand, DeleteTestOrderError, DeleteTestOrderResponse};
pub use update::{UpdateTestOrderCommand, UpdateTestOrderError, UpdateTestOrderResponse};
