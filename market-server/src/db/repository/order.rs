//! Order Repository
//!
//! Owns the two concurrency-critical operations of the core:
//!
//! - [`create_with_items`](OrderRepository::create_with_items): one
//!   transaction inserting the order and its items and decrementing stock
//!   behind a `stock >= quantity` guard. A guard miss aborts the whole
//!   transaction: no partial stock movement, no orphan order.
//! - [`conditional_update`](OrderRepository::conditional_update): a single
//!   UPDATE whose WHERE clause encodes the expected prior state. The
//!   affected-row count is the exactly-once signal; the database row is the
//!   only serialization point, so multiple server instances race safely.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{
    NewOrder, Order, OrderItemDetail, OrderStatus, OrderWithItems,
};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// Expected prior state for a conditional update
///
/// Every field becomes a WHERE conjunct; an update that matches zero rows
/// lost the race and reports `affected == 0`.
#[derive(Debug, Clone)]
pub struct TransitionGuard {
    pub expected_status: OrderStatus,
    /// Require `runner_id IS NULL` (pull-accept path)
    pub require_unassigned: bool,
    /// Require `runner_id` to equal this caller (completion path)
    pub expected_runner: Option<i64>,
    /// Require `client_id` to differ from this caller (self-assignment)
    pub reject_client: Option<i64>,
}

impl TransitionGuard {
    pub fn expecting(status: OrderStatus) -> Self {
        Self {
            expected_status: status,
            require_unassigned: false,
            expected_runner: None,
            reject_client: None,
        }
    }

    pub fn unassigned(mut self) -> Self {
        self.require_unassigned = true;
        self
    }

    pub fn runner(mut self, runner_id: i64) -> Self {
        self.expected_runner = Some(runner_id);
        self
    }

    pub fn not_client(mut self, client_id: i64) -> Self {
        self.reject_client = Some(client_id);
        self
    }
}

/// Fields written by a conditional update
#[derive(Debug, Clone)]
pub struct OrderPatch {
    pub status: OrderStatus,
    pub runner_id: Option<i64>,
    pub runner_base_fee: Option<f64>,
    pub runner_per_km_fee: Option<f64>,
    pub delivery_distance_km: Option<f64>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status,
            runner_id: None,
            runner_base_fee: None,
            runner_per_km_fee: None,
            delivery_distance_km: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Order>> {
        let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(order)
    }

    pub async fn find_with_items(&self, id: i64) -> RepoResult<Option<OrderWithItems>> {
        let order = match self.find_by_id(id).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let items = self.items_of(id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn items_of(&self, order_id: i64) -> RepoResult<Vec<OrderItemDetail>> {
        let items: Vec<OrderItemDetail> = sqlx::query_as(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price_at_purchase,
                   p.name AS product_name, p.provider_id
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(self.base.pool())
        .await?;
        Ok(items)
    }

    /// Create the order, its items and the stock decrements in ONE
    /// transaction. Each decrement carries a `stock >= quantity` guard; a
    /// guard miss rolls the whole transaction back, which is what keeps two
    /// concurrent orders from jointly overselling a product.
    pub async fn create_with_items(&self, draft: NewOrder) -> RepoResult<OrderWithItems> {
        if draft.items.is_empty() {
            return Err(RepoError::Validation("order must contain items".into()));
        }

        let mut tx = self.base.pool().begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (client_id, city_id, total_price, status, delivery_address,
                                destination_lat, destination_lng, created_at)
            VALUES ($1, $2, $3, 'PENDING', $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(draft.client_id)
        .bind(draft.city_id)
        .bind(draft.total_price)
        .bind(&draft.delivery_address)
        .bind(draft.destination_lat)
        .bind(draft.destination_lng)
        .bind(now_millis())
        .fetch_one(&mut *tx)
        .await?;

        for item in &draft.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price_at_purchase)
            .execute(&mut *tx)
            .await?;

            let decremented = sqlx::query(
                "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1",
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                // Dropping the transaction rolls everything back
                return Err(RepoError::Conflict(format!(
                    "insufficient stock for product {}",
                    item.product_id
                )));
            }
        }

        tx.commit().await?;

        self.find_with_items(order_id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to load created order".to_string()))
    }

    /// Compare-and-swap over the order row. Returns the affected-row count:
    /// 1 means the transition happened, 0 means the caller lost the race
    /// (or the guard never matched).
    pub async fn conditional_update(
        &self,
        id: i64,
        guard: &TransitionGuard,
        patch: &OrderPatch,
    ) -> RepoResult<u64> {
        let mut sets = vec!["status = ?"];
        if patch.runner_id.is_some() {
            sets.push("runner_id = ?");
        }
        if patch.runner_base_fee.is_some() {
            sets.push("runner_base_fee = ?");
        }
        if patch.runner_per_km_fee.is_some() {
            sets.push("runner_per_km_fee = ?");
        }
        if patch.delivery_distance_km.is_some() {
            sets.push("delivery_distance_km = ?");
        }

        let mut wheres = vec!["id = ?", "status = ?"];
        if guard.require_unassigned {
            wheres.push("runner_id IS NULL");
        }
        if guard.expected_runner.is_some() {
            wheres.push("runner_id = ?");
        }
        if guard.reject_client.is_some() {
            wheres.push("client_id != ?");
        }

        let sql = format!(
            "UPDATE orders SET {} WHERE {}",
            sets.join(", "),
            wheres.join(" AND ")
        );

        let mut query = sqlx::query(&sql).bind(patch.status);
        if let Some(v) = patch.runner_id {
            query = query.bind(v);
        }
        if let Some(v) = patch.runner_base_fee {
            query = query.bind(v);
        }
        if let Some(v) = patch.runner_per_km_fee {
            query = query.bind(v);
        }
        if let Some(v) = patch.delivery_distance_km {
            query = query.bind(v);
        }
        query = query.bind(id).bind(guard.expected_status);
        if let Some(v) = guard.expected_runner {
            query = query.bind(v);
        }
        if let Some(v) = guard.reject_client {
            query = query.bind(v);
        }

        let res = query.execute(self.base.pool()).await?;
        Ok(res.rows_affected())
    }

    /// Cancel a PENDING order and return its reserved stock, atomically.
    /// Returns 0 when the order was no longer PENDING (nothing happens).
    pub async fn cancel_restock(&self, id: i64) -> RepoResult<u64> {
        let mut tx = self.base.pool().begin().await?;

        let flipped = sqlx::query(
            "UPDATE orders SET status = 'CANCELLED' WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return Ok(0);
        }

        let items: Vec<(i64, i64)> =
            sqlx::query_as("SELECT product_id, quantity FROM order_items WHERE order_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        for (product_id, quantity) in items {
            sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
                .bind(quantity)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(1)
    }

    /// PENDING orders with no runner — the pool runners claim from
    pub async fn list_available(&self) -> RepoResult<Vec<OrderWithItems>> {
        let orders: Vec<Order> = sqlx::query_as(
            r#"
            SELECT * FROM orders
            WHERE status = 'PENDING' AND runner_id IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.base.pool())
        .await?;

        self.attach_items(orders).await
    }

    pub async fn list_for_client(&self, client_id: i64) -> RepoResult<Vec<OrderWithItems>> {
        let orders: Vec<Order> = sqlx::query_as(
            "SELECT * FROM orders WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(self.base.pool())
        .await?;

        self.attach_items(orders).await
    }

    pub async fn list_for_runner(&self, runner_id: i64) -> RepoResult<Vec<OrderWithItems>> {
        let orders: Vec<Order> = sqlx::query_as(
            "SELECT * FROM orders WHERE runner_id = $1 ORDER BY created_at DESC",
        )
        .bind(runner_id)
        .fetch_all(self.base.pool())
        .await?;

        self.attach_items(orders).await
    }

    /// Orders that contain at least one of the provider's products, with
    /// the item list narrowed to that provider's lines
    pub async fn list_for_provider(&self, provider_id: i64) -> RepoResult<Vec<OrderWithItems>> {
        let orders: Vec<Order> = sqlx::query_as(
            r#"
            SELECT DISTINCT o.* FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            JOIN products p ON p.id = oi.product_id
            WHERE p.provider_id = $1
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(self.base.pool())
        .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self
                .items_of(order.id)
                .await?
                .into_iter()
                .filter(|item| item.provider_id == provider_id)
                .collect();
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    async fn attach_items(&self, orders: Vec<Order>) -> RepoResult<Vec<OrderWithItems>> {
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.items_of(order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }
}
