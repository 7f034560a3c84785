//! Order Model

use serde::{Deserialize, Serialize};

/// Order lifecycle state
///
/// Legal transitions: PENDING → CONFIRMED → COMPLETED, plus
/// PENDING → CANCELLED. No transition skips a state or reverses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Order entity
///
/// `total_price` is computed once at creation from line-item snapshots and
/// never recomputed. Fee fields are snapshotted from the runner profile at
/// assignment time; `delivery_distance_km` stays NULL when the order has no
/// destination coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub runner_id: Option<i64>,
    pub city_id: i64,
    /// Total in currency unit, fixed at creation
    pub total_price: f64,
    pub status: OrderStatus,
    pub delivery_address: Option<String>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub runner_base_fee: Option<f64>,
    pub runner_per_km_fee: Option<f64>,
    pub delivery_distance_km: Option<f64>,
    pub created_at: i64,
}

/// Order line item — created once, never mutated
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Product price copied at creation time
    pub price_at_purchase: f64,
}

/// Line item joined with the product fields authorization and listings need
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price_at_purchase: f64,
    pub product_name: String,
    pub provider_id: i64,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

impl OrderWithItems {
    /// True when `user_id` provides at least one product among the items
    pub fn has_provider(&self, user_id: i64) -> bool {
        self.items.iter().any(|item| item.provider_id == user_id)
    }
}

/// Insert payload for [`create_with_items`](crate::db::repository::OrderRepository::create_with_items)
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client_id: i64,
    pub city_id: i64,
    pub total_price: f64,
    pub delivery_address: Option<String>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub items: Vec<NewOrderItem>,
}

/// Line item insert payload with the snapshotted price
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub price_at_purchase: f64,
}
