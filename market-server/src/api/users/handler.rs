//! Users API Handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{CurrentUser, pin};
use crate::core::ServerState;
use crate::db::repository::{RunnerRepository, UserRepository};
use shared::models::Role;
use shared::{ApiResponse, AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct SetPinRequest {
    #[validate(length(min = 4, max = 16, message = "PIN must be 4-16 characters"))]
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct RoleGrantedResponse {
    pub roles: Vec<Role>,
    /// Fresh token carrying the updated role set
    pub access_token: String,
}

/// POST /api/users/pin — set the purchase PIN
pub async fn set_pin(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<SetPinRequest>,
) -> AppResult<ApiResponse<()>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let hash = pin::hash_pin(&req.pin)
        .map_err(|e| AppError::internal(format!("Failed to hash PIN: {e}")))?;

    let repo = UserRepository::new(state.pool());
    repo.set_pin(user.id, &hash).await?;

    tracing::info!(user_id = user.id, "Purchase PIN configured");
    Ok(ApiResponse::ok())
}

/// POST /api/users/roles/runner — acquire the runner role
///
/// Creates the runner profile lazily on first grant and returns a fresh
/// token carrying the new role set.
pub async fn become_runner(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<RoleGrantedResponse>> {
    let users = UserRepository::new(state.pool());
    let updated = users.add_role(user.id, Role::Runner).await?;

    // Lazy profile creation — idempotent
    let runners = RunnerRepository::new(state.pool());
    runners.create_default(user.id).await?;

    grant_response(&state, &updated)
}

/// POST /api/users/roles/provider — acquire the provider role
pub async fn become_provider(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<RoleGrantedResponse>> {
    let users = UserRepository::new(state.pool());
    let updated = users.add_role(user.id, Role::Provider).await?;
    grant_response(&state, &updated)
}

fn grant_response(
    state: &ServerState,
    user: &crate::db::models::User,
) -> AppResult<Json<RoleGrantedResponse>> {
    let roles = user.role_set();
    let access_token = state
        .jwt_service()
        .generate_token(user.id, &user.name, &roles)
        .map_err(|e| AppError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(RoleGrantedResponse {
        roles,
        access_token,
    }))
}
