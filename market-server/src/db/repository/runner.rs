//! Runner Profile Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ActiveRunner, RunnerProfile, RunnerProfileUpdate};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct RunnerRepository {
    base: BaseRepository,
}

impl RunnerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    pub async fn find_by_user(&self, user_id: i64) -> RepoResult<Option<RunnerProfile>> {
        let profile: Option<RunnerProfile> =
            sqlx::query_as("SELECT * FROM runner_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.base.pool())
                .await?;
        Ok(profile)
    }

    /// Create the default profile for a user who just acquired the runner
    /// role. No-op when the profile already exists.
    pub async fn create_default(&self, user_id: i64) -> RepoResult<RunnerProfile> {
        sqlx::query(
            "INSERT INTO runner_profiles (user_id) VALUES ($1) ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(self.base.pool())
        .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create runner profile".to_string()))
    }

    /// Runner self-service update (location, pricing, activity toggle)
    pub async fn update(
        &self,
        user_id: i64,
        data: RunnerProfileUpdate,
    ) -> RepoResult<RunnerProfile> {
        let mut sets: Vec<&str> = Vec::new();

        if data.base_lat.is_some() {
            sets.push("base_lat = ?");
        }
        if data.base_lng.is_some() {
            sets.push("base_lng = ?");
        }
        if data.price_base.is_some() {
            sets.push("price_base = ?");
        }
        if data.price_per_km.is_some() {
            sets.push("price_per_km = ?");
        }
        if data.min_fee.is_some() {
            sets.push("min_fee = ?");
        }
        if data.max_distance_km.is_some() {
            sets.push("max_distance_km = ?");
        }
        if data.is_active.is_some() {
            sets.push("is_active = ?");
        }

        if sets.is_empty() {
            return self
                .find_by_user(user_id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Runner {} not found", user_id)));
        }

        let sql = format!(
            "UPDATE runner_profiles SET {} WHERE user_id = ?",
            sets.join(", ")
        );

        let mut query = sqlx::query(&sql);
        if let Some(v) = data.base_lat {
            query = query.bind(v);
        }
        if let Some(v) = data.base_lng {
            query = query.bind(v);
        }
        if let Some(v) = data.price_base {
            query = query.bind(v);
        }
        if let Some(v) = data.price_per_km {
            query = query.bind(v);
        }
        if let Some(v) = data.min_fee {
            query = query.bind(v);
        }
        if let Some(v) = data.max_distance_km {
            query = query.bind(v);
        }
        if let Some(v) = data.is_active {
            query = query.bind(v);
        }
        query = query.bind(user_id);

        let res = query.execute(self.base.pool()).await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Runner {} not found", user_id)));
        }

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Runner {} not found", user_id)))
    }

    /// Active runners joined with their display name, for the matcher
    pub async fn list_active(&self) -> RepoResult<Vec<ActiveRunner>> {
        let runners: Vec<ActiveRunner> = sqlx::query_as(
            r#"
            SELECT rp.user_id, u.name, rp.base_lat, rp.base_lng,
                   rp.price_base, rp.price_per_km, rp.min_fee,
                   rp.max_distance_km, rp.rating_avg
            FROM runner_profiles rp
            JOIN users u ON u.id = rp.user_id
            WHERE rp.is_active = 1
            "#,
        )
        .fetch_all(self.base.pool())
        .await?;
        Ok(runners)
    }
}
