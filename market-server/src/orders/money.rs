//! Money arithmetic using rust_decimal for precision
//!
//! Prices are stored and transported as f64 but every computation runs in
//! `Decimal`, rounded to 2 decimal places (half-up) at the edges. Order
//! totals are accumulated in `Decimal` so they never drift from the sum of
//! the snapshotted line prices.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
///
/// Input values should be validated finite at the boundary. If NaN/Infinity
/// somehow reaches here, logs an error and returns ZERO to avoid silent
/// corruption in financial calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round an f64 amount to 2 decimal places via Decimal
#[inline]
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Line total: price × quantity
pub fn line_total(price: f64, quantity: i64) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

/// Order total: exact Decimal sum of (price × quantity) across lines
pub fn order_total(lines: &[(f64, i64)]) -> f64 {
    let total: Decimal = lines
        .iter()
        .map(|(price, quantity)| line_total(*price, *quantity))
        .sum();
    to_f64(total)
}
