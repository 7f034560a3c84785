//! Product Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate};
use shared::util::now_millis;
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Product>> {
        let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(product)
    }

    /// Resolve a batch of product ids. The caller is responsible for
    /// noticing missing ids (result may be shorter than the input).
    pub async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite has no array binds; expand the placeholder list
        let placeholders = (1..=ids.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT * FROM products WHERE id IN ({})", placeholders);

        let mut query = sqlx::query_as::<_, Product>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let products = query.fetch_all(self.base.pool()).await?;
        Ok(products)
    }

    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.price < 0.0 {
            return Err(RepoError::Validation("price must be non-negative".into()));
        }
        if data.stock < 0 {
            return Err(RepoError::Validation("stock must be non-negative".into()));
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (provider_id, city_id, name, price, stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(data.provider_id)
        .bind(data.city_id)
        .bind(&data.name)
        .bind(data.price)
        .bind(data.stock)
        .bind(now_millis())
        .fetch_one(self.base.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Current stock counter, for callers that only need the number
    pub async fn stock_of(&self, id: i64) -> RepoResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        stock.ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }
}
