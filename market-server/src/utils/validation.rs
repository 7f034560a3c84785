//! Boundary validation helpers

use shared::{AppError, AppResult, ErrorCode};

/// Maximum length for free-text fields (delivery address)
pub const MAX_ADDRESS_LEN: usize = 500;

/// Validate a latitude/longitude pair
pub fn validate_coordinates(lat: f64, lng: f64) -> AppResult<()> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::InvalidCoordinates,
            "Coordinates must be finite numbers",
        ));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(
            AppError::with_message(ErrorCode::InvalidCoordinates, "Latitude out of range")
                .with_detail("lat", lat),
        );
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(
            AppError::with_message(ErrorCode::InvalidCoordinates, "Longitude out of range")
                .with_detail("lng", lng),
        );
    }
    Ok(())
}

/// Validate an optional free-text field against a length limit
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> AppResult<()> {
    if let Some(text) = value {
        if text.len() > max_len {
            return Err(AppError::validation(format!(
                "{} exceeds maximum length ({})",
                field, max_len
            )));
        }
    }
    Ok(())
}
