//! User Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{User, UserCreate};
use shared::models::{Role, join_roles};
use shared::util::now_millis;
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(user)
    }

    /// Create a user (called by the external registration flow)
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, name, roles, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&data.email)
        .bind(&data.name)
        .bind(join_roles(&data.roles))
        .bind(now_millis())
        .fetch_one(self.base.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Store the argon2 hash of the purchase PIN
    pub async fn set_pin(&self, user_id: i64, pin_hash: &str) -> RepoResult<()> {
        let res = sqlx::query("UPDATE users SET pin = $1 WHERE id = $2")
            .bind(pin_hash)
            .bind(user_id)
            .execute(self.base.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    /// Append a role to the user's role set (no-op when already present)
    pub async fn add_role(&self, user_id: i64, role: Role) -> RepoResult<User> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", user_id)))?;

        let mut roles = user.role_set();
        if !roles.contains(&role) {
            roles.push(role);
            sqlx::query("UPDATE users SET roles = $1 WHERE id = $2")
                .bind(join_roles(&roles))
                .bind(user_id)
                .execute(self.base.pool())
                .await?;
        }

        self.find_by_id(user_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", user_id)))
    }
}
