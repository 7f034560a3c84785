//! Authentication
//!
//! JWT validation and the purchase-PIN gate. Credential exchange (login,
//! registration, MFA) is handled by the external auth service.

mod extractor;
mod jwt;
pub mod pin;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
