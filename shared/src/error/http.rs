//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::RunnerNotFound
            | Self::ProductNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict — lost a conditional update, re-query and retry
            Self::AlreadyExists | Self::OrderNotAvailable | Self::OrderCompleteRejected => {
                StatusCode::CONFLICT
            }

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::PinInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleRequired => StatusCode::FORBIDDEN,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::PinNotSet
            | Self::OrderNotPending
            | Self::SelfAssignment
            | Self::MultiCityCart
            | Self::RunnerInactive
            | Self::InvalidCoordinates
            | Self::InsufficientStock => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
