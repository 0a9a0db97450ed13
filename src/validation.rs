//! Reading and configuration validation.
//!
//! [`is_valid_reading`] classifies a sensor value; it never fails, invalid readings are
//! kept and tagged like any other. The remaining helpers are used by
//! [`crate::config::AppConfig::validate`].

use std::ops::RangeInclusive;

/// Physically plausible sensor range in °C (both bounds valid).
pub const VALID_RANGE_C: RangeInclusive<f64> = -50.0..=150.0;

/// Returns `true` if `temperature` is a usable reading.
///
/// NaN and anything outside [`VALID_RANGE_C`] is invalid.
pub fn is_valid_reading(temperature: f64) -> bool {
    !temperature.is_nan() && is_in_range(temperature, VALID_RANGE_C).is_ok()
}

/// Validates if a given value is within a specified numeric range.
///
/// # Arguments
///
/// * `value` - The value to validate.
/// * `range` - The inclusive range to validate against.
///
/// # Returns
///
/// * `Ok(())` if the value is within the range.
/// * `Err(&'static str)` if the value is outside the range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

/// Validates that a value is finite and strictly positive.
pub fn is_positive_finite(value: f64) -> Result<(), &'static str> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err("Value must be a finite number greater than 0")
    }
}

/// Validates that a value is finite (not NaN or infinite).
pub fn is_finite(value: f64) -> Result<(), &'static str> {
    if value.is_finite() {
        Ok(())
    } else {
        Err("Value must be a finite number")
    }
}

/// Validates if a given string is a valid file path.
///
/// # Returns
///
/// * `Ok(())` if the file path is valid.
/// * `Err(&'static str)` if the file path is empty or contains null bytes.
pub fn is_valid_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("File path cannot be empty");
    }
    if path.contains('\0') {
        return Err("File path cannot contain null bytes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_valid() {
        assert!(is_valid_reading(-50.0));
        assert!(is_valid_reading(150.0));
        assert!(is_valid_reading(0.0));
        assert!(is_valid_reading(26.3));
    }

    #[test]
    fn out_of_range_and_nan_are_invalid() {
        assert!(!is_valid_reading(f64::NAN));
        assert!(!is_valid_reading(-50.000_001));
        assert!(!is_valid_reading(150.000_001));
        assert!(!is_valid_reading(f64::INFINITY));
        assert!(!is_valid_reading(f64::NEG_INFINITY));
    }

    #[test]
    fn sweep_matches_range() {
        let mut t = -100.0;
        while t <= 200.0 {
            assert_eq!(is_valid_reading(t), (-50.0..=150.0).contains(&t), "t = {t}");
            t += 0.5;
        }
    }

    #[test]
    fn positive_finite() {
        assert!(is_positive_finite(0.5).is_ok());
        assert!(is_positive_finite(0.0).is_err());
        assert!(is_positive_finite(-1.0).is_err());
        assert!(is_positive_finite(f64::NAN).is_err());
        assert!(is_positive_finite(f64::INFINITY).is_err());
    }

    #[test]
    fn paths() {
        assert!(is_valid_path("data").is_ok());
        assert!(is_valid_path("").is_err());
        assert!(is_valid_path("bad\0path").is_err());
    }
}
