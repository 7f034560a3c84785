//! City Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{City, CityCreate};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct CityRepository {
    base: BaseRepository,
}

impl CityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<City>> {
        let city: Option<City> = sqlx::query_as("SELECT * FROM cities WHERE id = $1")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(city)
    }

    pub async fn create(&self, data: CityCreate) -> RepoResult<City> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO cities (name, slug, is_active) VALUES ($1, $2, 1) RETURNING id",
        )
        .bind(&data.name)
        .bind(&data.slug)
        .fetch_one(self.base.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create city".to_string()))
    }
}
