//! Two-decimal arithmetic shared by quantities and monetary amounts.
//!
//! Amounts are plain `f64` values kept at two decimal places. Every derived
//! value is rounded once, at the point it is computed, so re-deriving it from
//! stored inputs always yields the stored result.

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted-average unit value: `round2(total_value / quantity)`, or `0.0`
/// when there is no quantity to divide by.
pub fn average_unit_value(total_value: f64, quantity: f64) -> f64 {
    if quantity == 0.0 {
        return 0.0;
    }
    round2(total_value / quantity)
}

/// `true` when `value` has no fractional part.
pub fn is_whole(value: f64) -> bool {
    value.fract() == 0.0
}
