//! Order domain
//!
//! - `service`: creation (the inventory-reserving transaction) and queries
//! - `money`: decimal arithmetic for totals and snapshots

pub mod money;
pub mod service;

pub use service::{CreateOrderRequest, Destination, OrderItemRequest, OrderService};
