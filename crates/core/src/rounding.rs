//! Display rounding shared by the metrics and savings calculations.
//!
//! Rounding is applied once, at the output boundary. Ties round toward positive
//! infinity (`-2.5 -> -2`, `2.5 -> 3`) so that signed deltas such as water
//! savings round the same way regardless of direction.

/// Round to the nearest integer, ties toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to one decimal place, ties toward positive infinity.
pub fn round_one_decimal(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// Round to the nearest integer and convert to `i64`.
///
/// Non-finite inputs map to 0.
pub fn round_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    round_half_up(value) as i64
}
