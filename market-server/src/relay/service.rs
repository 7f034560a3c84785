//! Relay authorization
//!
//! Gate-keeps the per-order rooms. Join is authorized against the order's
//! participants; every publish is re-validated against the CURRENT order
//! row, because a join from minutes ago proves nothing about who the
//! assigned runner is now.

use crate::auth::CurrentUser;
use crate::db::repository::OrderRepository;
use crate::relay::hub::{LocationBroadcast, LocationHub};
use crate::utils::validation::validate_coordinates;
use shared::models::Role;
use shared::relay::LocationPoint;
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct RelayService {
    orders: OrderRepository,
    hub: LocationHub,
}

impl RelayService {
    pub fn new(pool: SqlitePool, hub: LocationHub) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            hub,
        }
    }

    pub fn hub(&self) -> &LocationHub {
        &self.hub
    }

    /// Join an order's room
    ///
    /// Authorized for: admins, the ordering client, the assigned runner,
    /// and providers owning at least one product among the items. A missing
    /// order and an unauthorized caller get the SAME generic response so
    /// outsiders cannot probe which order ids exist.
    pub async fn join(
        &self,
        order_id: i64,
        user: &CurrentUser,
    ) -> AppResult<(broadcast::Receiver<LocationBroadcast>, Vec<LocationPoint>)> {
        let order = match self.orders.find_with_items(order_id).await? {
            Some(order) => order,
            None => return Err(generic_denied()),
        };

        let authorized = user.roles.contains(&Role::Admin)
            || order.order.client_id == user.id
            || order.order.runner_id == Some(user.id)
            || (user.roles.contains(&Role::Provider) && order.has_provider(user.id));

        if !authorized {
            tracing::debug!(order_id, user_id = user.id, "Rejected room join");
            return Err(generic_denied());
        }

        Ok(self.hub.subscribe(order_id))
    }

    /// Publish the runner's position to an order's room
    ///
    /// Only the currently assigned runner may publish; the check runs
    /// against a fresh order read on EVERY call.
    pub async fn publish_location(
        &self,
        order_id: i64,
        user: &CurrentUser,
        lat: f64,
        lng: f64,
    ) -> AppResult<LocationPoint> {
        validate_coordinates(lat, lng)?;

        let order = match self.orders.find_by_id(order_id).await? {
            Some(order) => order,
            None => return Err(generic_denied()),
        };

        if order.runner_id != Some(user.id) {
            tracing::debug!(order_id, user_id = user.id, "Rejected location publish");
            return Err(generic_denied());
        }

        let point = LocationPoint {
            lat,
            lng,
            recorded_at: now_millis(),
        };
        self.hub.publish(order_id, user.id, point.clone());
        Ok(point)
    }

    /// Called when a subscriber disconnects; reaps the room if empty
    pub fn leave(&self, order_id: i64) {
        self.hub.drop_if_idle(order_id);
    }
}

/// The one response outsiders ever see, whether the order is missing or
/// merely not theirs
fn generic_denied() -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, "Order not found")
}
