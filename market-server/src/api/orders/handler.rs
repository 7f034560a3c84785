//! Orders API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderWithItems};
use crate::delivery::AssignmentService;
use crate::orders::{CreateOrderRequest, OrderService};
use shared::models::Role;
use shared::{AppError, AppResult, ErrorCode};

fn require_role(user: &CurrentUser, role: Role) -> AppResult<()> {
    if user.has_role(role) {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::RoleRequired,
            format!("{} role required", role),
        ))
    }
}

/// POST /api/orders — create an order (client)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<Json<OrderWithItems>> {
    require_role(&user, Role::Client)?;
    let service = OrderService::new(state.pool());
    let order = service.create_order(user.id, req).await?;
    Ok(Json(order))
}

/// GET /api/orders — role-scoped listing
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let service = OrderService::new(state.pool());
    let orders = service.list_orders(user.id, &user.roles).await?;
    Ok(Json(orders))
}

/// GET /api/orders/available — the unassigned PENDING pool (runner)
pub async fn available(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    require_role(&user, Role::Runner)?;
    let service = OrderService::new(state.pool());
    let orders = service.available_orders().await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id} — participant-scoped fetch
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderWithItems>> {
    let service = OrderService::new(state.pool());
    let order = service.get_order(id, user.id, &user.roles).await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/accept — claim from the pool (runner)
pub async fn accept(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    require_role(&user, Role::Runner)?;
    let service = AssignmentService::new(state.pool());
    let order = service.accept_order(id, user.id).await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/complete — mark delivered (assigned runner)
pub async fn complete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    require_role(&user, Role::Runner)?;
    let service = AssignmentService::new(state.pool());
    let order = service.complete_order(id, user.id).await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/cancel — cancel a PENDING order (owner or admin)
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let service = AssignmentService::new(state.pool());
    let order = service.cancel_order(id, user.id, &user.roles).await?;
    Ok(Json(order))
}
