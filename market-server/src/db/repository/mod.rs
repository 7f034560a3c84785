//! Repository Module
//!
//! Per-aggregate data access over the SQLite pool. All multi-step
//! mutations run inside explicit transactions; every state transition is a
//! single conditional UPDATE whose affected-row count is the outcome.

// Accounts
pub mod user;

// Catalog
pub mod city;
pub mod product;

// Orders
pub mod order;

// Delivery
pub mod runner;

// Re-exports
pub use city::CityRepository;
pub use order::{OrderPatch, OrderRepository, TransitionGuard};
pub use product::ProductRepository;
pub use runner::RunnerRepository;
pub use user::UserRepository;

use sqlx::SqlitePool;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".to_string()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

impl From<RepoError> for shared::AppError {
    fn from(err: RepoError) -> Self {
        use shared::{AppError, ErrorCode};
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Conflict(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => AppError::with_message(ErrorCode::ValidationFailed, msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Base repository with pool reference
#[derive(Debug, Clone)]
pub struct BaseRepository {
    pool: SqlitePool,
}

impl BaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
