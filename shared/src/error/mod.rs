//! Unified error handling
//!
//! - [`ErrorCode`]: numeric error codes grouped by domain
//! - [`ErrorCategory`]: coarse classification derived from the code range
//! - [`AppError`] / [`AppResult`]: the application error type
//! - [`ApiResponse`]: the response envelope shared by every endpoint

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError, AppResult};
