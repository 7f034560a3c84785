//! Delivery API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::delivery::{AssignmentService, RunnerCandidate};
use shared::models::Role;
use shared::{AppError, AppResult, ErrorCode};

#[derive(Debug, Deserialize)]
pub struct PreviewDeliveryRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct SelectRunnerRequest {
    pub runner_id: i64,
}

fn require_client_or_admin(user: &CurrentUser) -> AppResult<()> {
    if user.has_role(Role::Client) {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::RoleRequired,
            "CLIENT role required",
        ))
    }
}

/// POST /api/orders/preview-delivery — ranked runner candidates
pub async fn preview_delivery(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<PreviewDeliveryRequest>,
) -> AppResult<Json<Vec<RunnerCandidate>>> {
    require_client_or_admin(&user)?;
    let service = AssignmentService::new(state.pool());
    let candidates = service.preview_delivery(req.lat, req.lng).await?;
    Ok(Json(candidates))
}

/// POST /api/orders/{id}/select-runner — manual assignment
pub async fn select_runner(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<SelectRunnerRequest>,
) -> AppResult<Json<Order>> {
    require_client_or_admin(&user)?;
    let service = AssignmentService::new(state.pool());
    let order = service
        .select_runner(id, req.runner_id, user.id, &user.roles)
        .await?;
    Ok(Json(order))
}
