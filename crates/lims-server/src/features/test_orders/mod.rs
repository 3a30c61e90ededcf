//! Test orders feature
//!
//! Audited CRUD for lab test orders. Writes run under the audit behavior
//! with the flat field-list payload shape.

pub mod commands;
pub mod entity;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateTestOrderCommand, CreateTestOrderError, CreateTestOrderResponse, DeleteTestOrderCommand,
    DeleteTestOrderError, DeleteTestOrderResponse, UpdateTestOrderCommand, UpdateTestOrderError,
    UpdateTestOrderResponse,
};
pub use entity::{find_test_order, TestOrder, ORDER_PRIORITIES, ORDER_STATUSES};
pub use queries::{
    GetTestOrderError, GetTestOrderQuery, GetTestOrderResponse, ListTestOrdersError,
    ListTestOrdersQuery, ListTestOrdersResponse, TestOrderListItem,
};
pub use routes::test_orders_routes;
