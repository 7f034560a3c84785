//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplace role
///
/// Users carry a *set* of roles (a client can also be a provider and a
/// runner). Stored and transported as comma-joined SCREAMING_SNAKE names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Client,
    Provider,
    Runner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Client => "CLIENT",
            Self::Provider => "PROVIDER",
            Self::Runner => "RUNNER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ADMIN" => Ok(Self::Admin),
            "CLIENT" => Ok(Self::Client),
            "PROVIDER" => Ok(Self::Provider),
            "RUNNER" => Ok(Self::Runner),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Parse a comma-joined role list; unknown entries are skipped
pub fn parse_roles(joined: &str) -> Vec<Role> {
    joined
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

/// Join a role set back into its storage form
pub fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
