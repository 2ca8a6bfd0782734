//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a trial counter to f64 while allowing precision loss in a single location.
#[must_use]
pub fn count_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert a collection length to f64, saturating on exotic platforms.
#[must_use]
pub fn len_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Round to `places` decimal digits, returning 0.0 for non-finite values.
///
/// Negative zero comes back as positive zero.
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let exponent = i32::try_from(places).unwrap_or(i32::MAX);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor + 0.0
}

/// `part / total * 100`, or 0.0 when `total` is zero.
#[must_use]
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count_to_f64(part) / count_to_f64(total) * 100.0
}
