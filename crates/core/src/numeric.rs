//! Small arithmetic helpers shared by the providers and the scoring engine.

/// Round to 2 decimal places (cents), half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Division that degrades to `0.0` instead of producing `inf`/`NaN`.
#[must_use]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
