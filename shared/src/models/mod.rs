//! Shared Models

pub mod role;

pub use role::{Role, join_roles, parse_roles};
