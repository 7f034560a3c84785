//! Server configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | WORK_DIR | /var/lib/market | Working directory (database, logs) |
//! | DATABASE_PATH | <WORK_DIR>/market.db | SQLite database file |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | development \| staging \| production |
//! | JWT_SECRET | (generated in dev) | Token signing secret |
//! | JWT_EXPIRATION_MINUTES | 1440 | Token lifetime |
//! | JWT_ISSUER / JWT_AUDIENCE | market-server / market-clients | Token claims |

use crate::auth::JwtConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for database and logs
    pub work_dir: String,
    /// SQLite database file path
    pub database_path: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let work_dir =
            std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/market".to_string());
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| format!("{}/market.db", work_dir));

        Self {
            work_dir,
            database_path,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Ensure the working directory exists
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
