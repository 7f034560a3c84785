//! Order creation and queries
//!
//! Creation is the only place inventory is reserved: validation (PIN,
//! products, single-city rule, stock) happens before any mutation, and the
//! insert plus stock decrements are one repository transaction.

use crate::auth::pin::verify_pin;
use crate::db::models::{NewOrder, NewOrderItem, OrderWithItems, Product};
use crate::db::repository::{OrderRepository, ProductRepository, RepoError, UserRepository};
use crate::orders::money;
use crate::utils::validation::{MAX_ADDRESS_LEN, validate_coordinates, validate_optional_text};
use serde::{Deserialize, Serialize};
use shared::models::Role;
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use validator::Validate;

/// Delivery destination coordinates
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Destination {
    pub lat: f64,
    pub lng: f64,
}

/// One requested line of the cart
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: i64,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i64,
}

/// Create order payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<OrderItemRequest>,
    pub delivery_address: Option<String>,
    pub destination: Option<Destination>,
    #[validate(length(min = 4, max = 16))]
    pub pin: String,
}

#[derive(Debug, Clone)]
pub struct OrderService {
    users: UserRepository,
    products: ProductRepository,
    orders: OrderRepository,
}

impl OrderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            products: ProductRepository::new(pool.clone()),
            orders: OrderRepository::new(pool),
        }
    }

    /// Create an order for `client_id`
    ///
    /// Fails without touching any state on: unknown user/product, bad PIN,
    /// multi-city cart, insufficient stock. The terminal write (order +
    /// items + stock decrements) is atomic.
    pub async fn create_order(
        &self,
        client_id: i64,
        req: CreateOrderRequest,
    ) -> AppResult<OrderWithItems> {
        req.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        validate_optional_text(&req.delivery_address, "delivery_address", MAX_ADDRESS_LEN)?;
        if let Some(dest) = &req.destination {
            validate_coordinates(dest.lat, dest.lng)?;
        }

        // Purchase-PIN gate
        let user = self
            .users
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let pin_hash = user.pin.as_deref().ok_or_else(|| {
            AppError::with_message(
                ErrorCode::PinNotSet,
                "Configure a purchase PIN in your profile first",
            )
        })?;
        if !verify_pin(&req.pin, pin_hash) {
            return Err(AppError::new(ErrorCode::PinInvalid));
        }

        // Resolve products
        let requested_ids: Vec<i64> = req.items.iter().map(|i| i.product_id).collect();
        let products = self.products.find_by_ids(&requested_ids).await?;
        let by_id: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let missing: Vec<i64> = requested_ids
            .iter()
            .filter(|id| !by_id.contains_key(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::ProductNotFound,
                "Some products not found",
            )
            .with_detail("missing", serde_json::json!(missing)));
        }

        // Single-city rule
        let cities: HashSet<i64> = products.iter().map(|p| p.city_id).collect();
        if cities.len() > 1 {
            return Err(AppError::new(ErrorCode::MultiCityCart));
        }
        let city_id = products
            .first()
            .map(|p| p.city_id)
            .ok_or_else(|| AppError::validation("order must contain items"))?;

        // Stock check before any mutation; the transaction guard below
        // still protects against a concurrent order racing past this read
        for item in &req.items {
            let product = by_id[&item.product_id];
            if product.stock < item.quantity {
                return Err(AppError::with_message(
                    ErrorCode::InsufficientStock,
                    format!("Insufficient stock for product {}", product.name),
                )
                .with_detail("product_id", product.id)
                .with_detail("available", product.stock)
                .with_detail("requested", item.quantity));
            }
        }

        // Totals from snapshotted prices, decimal arithmetic
        let lines: Vec<(f64, i64)> = req
            .items
            .iter()
            .map(|item| (by_id[&item.product_id].price, item.quantity))
            .collect();
        let total_price = money::order_total(&lines);

        let draft = NewOrder {
            client_id,
            city_id,
            total_price,
            delivery_address: req.delivery_address.clone(),
            destination_lat: req.destination.map(|d| d.lat),
            destination_lng: req.destination.map(|d| d.lng),
            items: req
                .items
                .iter()
                .map(|item| NewOrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price_at_purchase: by_id[&item.product_id].price,
                })
                .collect(),
        };

        let created = self.orders.create_with_items(draft).await.map_err(|e| {
            match e {
                // A concurrent order drained the stock between the check
                // and the transaction; routine, surfaced like the check
                RepoError::Conflict(msg) => {
                    AppError::with_message(ErrorCode::InsufficientStock, msg)
                }
                other => other.into(),
            }
        })?;

        tracing::info!(
            order_id = created.order.id,
            client_id,
            total = created.order.total_price,
            "Order created"
        );
        Ok(created)
    }

    /// Role-scoped order listing: providers see orders containing their
    /// products (items narrowed to theirs), runners their assignments,
    /// clients their own orders.
    pub async fn list_orders(
        &self,
        user_id: i64,
        roles: &[Role],
    ) -> AppResult<Vec<OrderWithItems>> {
        if roles.contains(&Role::Provider) {
            Ok(self.orders.list_for_provider(user_id).await?)
        } else if roles.contains(&Role::Runner) {
            Ok(self.orders.list_for_runner(user_id).await?)
        } else if roles.contains(&Role::Client) || roles.contains(&Role::Admin) {
            Ok(self.orders.list_for_client(user_id).await?)
        } else {
            Ok(Vec::new())
        }
    }

    /// Fetch one order, restricted to its participants
    pub async fn get_order(
        &self,
        id: i64,
        user_id: i64,
        roles: &[Role],
    ) -> AppResult<OrderWithItems> {
        let order = self
            .orders
            .find_with_items(id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
            })?;

        if roles.contains(&Role::Admin) {
            return Ok(order);
        }

        let is_client = order.order.client_id == user_id;
        let is_runner = order.order.runner_id == Some(user_id);
        let is_provider = order.has_provider(user_id);

        if !is_client && !is_runner && !is_provider {
            return Err(AppError::permission_denied(
                "You do not have permission to view this order",
            ));
        }

        Ok(order)
    }

    /// PENDING, unassigned orders for the runner pool
    pub async fn available_orders(&self) -> AppResult<Vec<OrderWithItems>> {
        Ok(self.orders.list_available().await?)
    }
}
