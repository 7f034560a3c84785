//! Product Model

use serde::{Deserialize, Serialize};

/// Product listing
///
/// `stock` is the inventory ledger: it is only ever decremented inside the
/// same transaction that creates an order item referencing it, and the
/// schema forbids it from going negative.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub provider_id: i64,
    pub city_id: i64,
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    pub stock: i64,
    pub created_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub provider_id: i64,
    pub city_id: i64,
    pub name: String,
    pub price: f64,
    pub stock: i64,
}
