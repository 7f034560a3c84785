//! Shared types for the marketplace platform
//!
//! Cross-cutting types consumed by the server crate (and any future
//! client crates):
//!
//! - **Errors** (`error`): unified error codes, `AppError`, `ApiResponse`
//! - **Models** (`models`): role set shared across auth and authorization
//! - **Relay** (`relay`): wire messages for the live tracking channel
//! - **Util** (`util`): small time helpers

pub mod error;
pub mod models;
pub mod relay;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::role::Role;
