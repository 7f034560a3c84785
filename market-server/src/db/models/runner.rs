//! Runner Profile Model

use serde::{Deserialize, Serialize};

/// Runner delivery profile (1:1 with a user)
///
/// Created lazily the first time a user acquires the runner role. A runner
/// with no base location cannot be matched. `is_active` is the runner's own
/// availability toggle, independent of the account state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RunnerProfile {
    pub user_id: i64,
    pub base_lat: Option<f64>,
    pub base_lng: Option<f64>,
    pub price_base: f64,
    pub price_per_km: f64,
    pub min_fee: f64,
    pub max_distance_km: f64,
    pub rating_avg: f64,
    pub is_active: bool,
}

/// Runner self-service update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerProfileUpdate {
    pub base_lat: Option<f64>,
    pub base_lng: Option<f64>,
    pub price_base: Option<f64>,
    pub price_per_km: Option<f64>,
    pub min_fee: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub is_active: Option<bool>,
}

/// Active runner row joined with the user's display name, as consumed by
/// the delivery matcher
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActiveRunner {
    pub user_id: i64,
    pub name: String,
    pub base_lat: Option<f64>,
    pub base_lng: Option<f64>,
    pub price_base: f64,
    pub price_per_km: f64,
    pub min_fee: f64,
    pub max_distance_km: f64,
    pub rating_avg: f64,
}
