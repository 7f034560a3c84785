//! Runners API Handlers — runner self-service

use axum::{Json, extract::State};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{RunnerProfile, RunnerProfileUpdate};
use crate::db::repository::RunnerRepository;
use crate::utils::validation::validate_coordinates;
use shared::models::Role;
use shared::{AppError, AppResult, ErrorCode};

fn require_runner(user: &CurrentUser) -> AppResult<()> {
    if user.has_role(Role::Runner) {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::RoleRequired,
            "RUNNER role required",
        ))
    }
}

/// GET /api/runners/me — own profile, created lazily if missing
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<RunnerProfile>> {
    require_runner(&user)?;
    let repo = RunnerRepository::new(state.pool());
    let profile = repo.create_default(user.id).await?;
    Ok(Json(profile))
}

/// PUT /api/runners/me — update base location, pricing, availability
pub async fn update_me(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<RunnerProfileUpdate>,
) -> AppResult<Json<RunnerProfile>> {
    require_runner(&user)?;

    // A partial coordinate update would leave the base in a broken state
    if req.base_lat.is_some() != req.base_lng.is_some() {
        return Err(AppError::invalid_request(
            "base_lat and base_lng must be updated together",
        ));
    }
    if let (Some(lat), Some(lng)) = (req.base_lat, req.base_lng) {
        validate_coordinates(lat, lng)?;
    }
    for fee in [req.price_base, req.price_per_km, req.min_fee, req.max_distance_km]
        .into_iter()
        .flatten()
    {
        if !fee.is_finite() || fee < 0.0 {
            return Err(AppError::validation("fees and radius must be non-negative"));
        }
    }

    let repo = RunnerRepository::new(state.pool());
    // Profile may not exist yet if the role was granted out of band
    repo.create_default(user.id).await?;
    let profile = repo.update(user.id, req).await?;
    Ok(Json(profile))
}
