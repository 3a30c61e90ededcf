//! Read operations for test orders

pub mod get;
pub mod list;

pub use get::{GetTestOrderError, GetTestOrderQuery, GetTestOrderResponse};
pub use list::{
    ListTestOrdersError, ListTestOrdersQuery, ListTestOrdersResponse, TestOrderListItem,
};
