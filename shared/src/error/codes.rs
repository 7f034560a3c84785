//! Unified error codes for the marketplace platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Delivery/runner errors
//! - 6xxx: Product errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Purchase PIN has not been configured
    PinNotSet = 1005,
    /// Purchase PIN is incorrect
    PinInvalid = 1006,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is not in the PENDING state
    OrderNotPending = 4002,
    /// Order was claimed by someone else (lost a conditional update)
    OrderNotAvailable = 4003,
    /// Completion rejected: wrong runner or wrong state
    OrderCompleteRejected = 4004,
    /// A client cannot deliver their own order
    SelfAssignment = 4005,
    /// Cart mixes products from more than one city
    MultiCityCart = 4006,

    // ==================== 5xxx: Delivery ====================
    /// Runner profile not found
    RunnerNotFound = 5001,
    /// Runner is not active
    RunnerInactive = 5002,
    /// Latitude/longitude out of range
    InvalidCoordinates = 5003,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Not enough stock for the requested quantity
    InsufficientStock = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::NotAuthenticated => "Not authenticated",
            Self::InvalidCredentials => "Invalid credentials",
            Self::TokenExpired => "Token has expired",
            Self::TokenInvalid => "Token is invalid",
            Self::PinNotSet => "Purchase PIN has not been configured",
            Self::PinInvalid => "Purchase PIN is incorrect",

            Self::PermissionDenied => "Permission denied",
            Self::RoleRequired => "Required role is missing",

            Self::OrderNotFound => "Order not found",
            Self::OrderNotPending => "Order must be PENDING for this operation",
            Self::OrderNotAvailable => "Order is no longer available",
            Self::OrderCompleteRejected => {
                "Order cannot be completed in its current state, or you are not the assigned runner"
            }
            Self::SelfAssignment => "You cannot deliver your own order",
            Self::MultiCityCart => "All products must belong to the same city",

            Self::RunnerNotFound => "Runner not found",
            Self::RunnerInactive => "Runner is not active",
            Self::InvalidCoordinates => "Coordinates are out of range",

            Self::ProductNotFound => "Product not found",
            Self::InsufficientStock => "Insufficient stock",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),

            1001 => Ok(Self::NotAuthenticated),
            1002 => Ok(Self::InvalidCredentials),
            1003 => Ok(Self::TokenExpired),
            1004 => Ok(Self::TokenInvalid),
            1005 => Ok(Self::PinNotSet),
            1006 => Ok(Self::PinInvalid),

            2001 => Ok(Self::PermissionDenied),
            2002 => Ok(Self::RoleRequired),

            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::OrderNotPending),
            4003 => Ok(Self::OrderNotAvailable),
            4004 => Ok(Self::OrderCompleteRejected),
            4005 => Ok(Self::SelfAssignment),
            4006 => Ok(Self::MultiCityCart),

            5001 => Ok(Self::RunnerNotFound),
            5002 => Ok(Self::RunnerInactive),
            5003 => Ok(Self::InvalidCoordinates),

            6001 => Ok(Self::ProductNotFound),
            6002 => Ok(Self::InsufficientStock),

            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),

            other => Err(format!("Unknown error code: {}", other)),
        }
    }
}
