//! Order assignment service
//!
//! Both assignment paths (client picks a runner, runner claims from the
//! pool) and the later transitions converge on one primitive: a conditional
//! UPDATE whose WHERE clause encodes the expected prior state. The database
//! row arbitrates every race; an affected-row count of zero is a routine
//! Conflict the caller resolves by re-querying, never an error worth
//! logging or retrying server-side.

use crate::db::models::{Order, OrderStatus, RunnerProfile};
use crate::db::repository::{OrderPatch, OrderRepository, RunnerRepository, TransitionGuard};
use crate::delivery::matcher::{self, DeliveryPoint, RunnerCandidate};
use crate::orders::money::round2;
use crate::utils::validation::validate_coordinates;
use shared::models::Role;
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct AssignmentService {
    orders: OrderRepository,
    runners: RunnerRepository,
}

impl AssignmentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            runners: RunnerRepository::new(pool),
        }
    }

    /// Rank active runners against a delivery point (pure preview)
    pub async fn preview_delivery(&self, lat: f64, lng: f64) -> AppResult<Vec<RunnerCandidate>> {
        validate_coordinates(lat, lng)?;
        let runners = self.runners.list_active().await?;
        Ok(matcher::rank_candidates(&runners, DeliveryPoint { lat, lng }))
    }

    /// Manual pick: the client (or an admin) assigns a chosen runner to a
    /// PENDING order
    pub async fn select_runner(
        &self,
        order_id: i64,
        runner_id: i64,
        caller_id: i64,
        caller_roles: &[Role],
    ) -> AppResult<Order> {
        let order = self.require_order(order_id).await?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::new(ErrorCode::OrderNotPending));
        }
        if !caller_roles.contains(&Role::Admin) && order.client_id != caller_id {
            return Err(AppError::permission_denied(
                "You can only assign runners to your own orders",
            ));
        }

        let runner = self
            .runners
            .find_by_user(runner_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RunnerNotFound))?;
        if !runner.is_active {
            return Err(AppError::new(ErrorCode::RunnerInactive));
        }

        let guard = TransitionGuard::expecting(OrderStatus::Pending);
        let patch = assign_patch(&order, &runner);

        let affected = self.orders.conditional_update(order_id, &guard, &patch).await?;
        if affected == 0 {
            // Someone else confirmed (or cancelled) it first
            return Err(AppError::new(ErrorCode::OrderNotAvailable));
        }

        tracing::info!(order_id, runner_id, caller_id, "Runner assigned");
        self.require_order(order_id).await
    }

    /// Pull model: a runner claims an unassigned PENDING order
    pub async fn accept_order(&self, order_id: i64, runner_id: i64) -> AppResult<Order> {
        let order = self.require_order(order_id).await?;

        if order.client_id == runner_id {
            return Err(AppError::new(ErrorCode::SelfAssignment));
        }

        // Fees are snapshotted at assignment time regardless of the path,
        // so the accepting runner must already have a profile
        let runner = self
            .runners
            .find_by_user(runner_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RunnerNotFound))?;

        let guard = TransitionGuard::expecting(OrderStatus::Pending)
            .unassigned()
            .not_client(runner_id);
        let patch = assign_patch(&order, &runner);

        let affected = self.orders.conditional_update(order_id, &guard, &patch).await?;
        if affected == 0 {
            return Err(AppError::with_message(
                ErrorCode::OrderNotAvailable,
                "Order is already accepted, not pending, or you cannot accept your own order",
            ));
        }

        tracing::info!(order_id, runner_id, "Order accepted from pool");
        self.require_order(order_id).await
    }

    /// The assigned runner marks a CONFIRMED order delivered
    pub async fn complete_order(&self, order_id: i64, runner_id: i64) -> AppResult<Order> {
        self.require_order(order_id).await?;

        let guard = TransitionGuard::expecting(OrderStatus::Confirmed).runner(runner_id);
        let patch = OrderPatch::status(OrderStatus::Completed);

        let affected = self.orders.conditional_update(order_id, &guard, &patch).await?;
        if affected == 0 {
            return Err(AppError::new(ErrorCode::OrderCompleteRejected));
        }

        tracing::info!(order_id, runner_id, "Order completed");
        self.require_order(order_id).await
    }

    /// Cancel a PENDING order and return its reserved stock
    pub async fn cancel_order(
        &self,
        order_id: i64,
        caller_id: i64,
        caller_roles: &[Role],
    ) -> AppResult<Order> {
        let order = self.require_order(order_id).await?;

        if !caller_roles.contains(&Role::Admin) && order.client_id != caller_id {
            return Err(AppError::permission_denied(
                "You can only cancel your own orders",
            ));
        }

        let affected = self.orders.cancel_restock(order_id).await?;
        if affected == 0 {
            return Err(AppError::with_message(
                ErrorCode::OrderNotAvailable,
                "Order can no longer be cancelled",
            ));
        }

        tracing::info!(order_id, caller_id, "Order cancelled, stock returned");
        self.require_order(order_id).await
    }

    async fn require_order(&self, order_id: i64) -> AppResult<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", order_id),
                )
            })
    }
}

/// Build the CONFIRMED patch with the fee snapshot, computing the delivery
/// distance when both the order destination and the runner base are known
fn assign_patch(order: &Order, runner: &RunnerProfile) -> OrderPatch {
    let distance = match (
        order.destination_lat,
        order.destination_lng,
        runner.base_lat,
        runner.base_lng,
    ) {
        (Some(dest_lat), Some(dest_lng), Some(base_lat), Some(base_lng)) => Some(round2(
            matcher::haversine_km(base_lat, base_lng, dest_lat, dest_lng),
        )),
        _ => None,
    };

    OrderPatch {
        status: OrderStatus::Confirmed,
        runner_id: Some(runner.user_id),
        runner_base_fee: Some(runner.price_base),
        runner_per_km_fee: Some(runner.price_per_km),
        delivery_distance_km: distance,
    }
}
