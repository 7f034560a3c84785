//! Server state — shared service handles
//!
//! `ServerState` holds the singletons every handler needs. It is `Clone`
//! (all members are `Arc`-backed or cheap handles) and is handed to axum
//! as router state.

use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::relay::{LocationHub, RelayService};
use shared::{AppError, AppResult};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct ServerState {
    /// Server configuration (immutable after startup)
    pub config: Config,
    /// Database service (SQLite pool)
    pub db: DbService,
    /// JWT validation service
    pub jwt_service: Arc<JwtService>,
    /// Live tracking room registry
    pub location_hub: LocationHub,
}

impl ServerState {
    pub fn new(config: Config, db: DbService, jwt_service: Arc<JwtService>) -> Self {
        Self {
            config,
            db,
            jwt_service,
            location_hub: LocationHub::new(),
        }
    }

    /// Initialize server state: working directory, database, services
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config
            .ensure_work_dir()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db = DbService::new(&config.database_path).await?;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self::new(config.clone(), db, jwt_service))
    }

    pub fn pool(&self) -> SqlitePool {
        self.db.pool.clone()
    }

    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// Relay service bound to this state's hub
    pub fn relay_service(&self) -> RelayService {
        RelayService::new(self.pool(), self.location_hub.clone())
    }
}
