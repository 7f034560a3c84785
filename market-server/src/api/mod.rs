//! HTTP API
//!
//! Thin axum routers/handlers over the domain services. Authentication is
//! the [`CurrentUser`](crate::auth::CurrentUser) extractor; authorization
//! beyond role checks lives in the services.

pub mod delivery;
pub mod health;
pub mod orders;
pub mod runners;
pub mod tracking;
pub mod users;
