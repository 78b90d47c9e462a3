//! Numeric conversion helpers centralizing lossy casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it into `0..=max`, returning 0 for NaN.
#[must_use]
pub fn round_f64_to_u8(value: f64, max: u8) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.round().clamp(0.0, f64::from(max));
    cast::<f64, u8>(clamped).unwrap_or(0)
}

/// Floor a non-negative f64 into a u32, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    cast::<f64, u32>(value.min(max).floor()).unwrap_or(0)
}

/// Convert a count to f64 in a single place.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Ratio of two counters, 0.0 when the denominator is zero.
#[must_use]
pub fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    f64::from(numerator) / f64::from(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_u8_clamps_and_handles_nan() {
        assert_eq!(round_f64_to_u8(100.8, 99), 99);
        assert_eq!(round_f64_to_u8(-4.0, 99), 0);
        assert_eq!(round_f64_to_u8(72.5, 99), 73);
        assert_eq!(round_f64_to_u8(f64::NAN, 99), 0);
    }

    #[test]
    fn floor_to_u32_ignores_negatives() {
        assert_eq!(floor_f64_to_u32(3.9), 3);
        assert_eq!(floor_f64_to_u32(-1.0), 0);
        assert_eq!(floor_f64_to_u32(f64::INFINITY), 0);
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert!(ratio(3, 0).abs() < f64::EPSILON);
        assert!((ratio(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
