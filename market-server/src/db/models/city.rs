//! City Model

use serde::{Deserialize, Serialize};

/// City (delivery zone)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
}

/// Create city payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityCreate {
    pub name: String,
    pub slug: String,
}
