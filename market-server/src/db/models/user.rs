//! User Model

use serde::{Deserialize, Serialize};
use shared::models::{Role, parse_roles};

/// User account
///
/// Credentials (password, MFA) live in the external auth service; this
/// table only carries what the core needs: identity, the role set and the
/// purchase-PIN hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    /// argon2 hash of the purchase PIN
    #[serde(skip_serializing)]
    pub pin: Option<String>,
    /// Comma-joined role set, e.g. "CLIENT,RUNNER"
    pub roles: String,
    pub created_at: i64,
}

impl User {
    pub fn role_set(&self) -> Vec<Role> {
        parse_roles(&self.roles)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role_set().contains(&role)
    }
}

/// Create user payload (invoked by the external registration flow)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub roles: Vec<Role>,
}
