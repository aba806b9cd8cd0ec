//! Foundation constants and numeric formatting.
//!
//! Everything that ends up in a content stream goes through
//! [`number_to_str`], so geometrically equal values always serialize to the
//! same bytes.

use crate::error::{Error, Result};

// ============================================================================
// Mathematical constants
// ============================================================================

pub const PI: f64 = std::f64::consts::PI;
pub const TAU: f64 = std::f64::consts::TAU;

/// Fractional digits kept by [`number_to_str`].
pub const NUMBER_PRECISION: usize = 4;

/// Fractional digits kept by [`format_number`] (function and shading
/// dictionaries).
pub const FUNCTION_PRECISION: usize = 8;

/// Convert degrees to radians.
#[inline]
pub fn deg2rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert radians to degrees.
#[inline]
pub fn rad2deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Check if two values are equal within epsilon.
#[inline]
pub fn is_equal_eps(v1: f64, v2: f64, epsilon: f64) -> bool {
    (v1 - v2).abs() <= epsilon
}

// ============================================================================
// Number formatting
// ============================================================================

fn strip_fraction(mut s: String) -> String {
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Format a number for a content stream.
///
/// Rounds to [`NUMBER_PRECISION`] fractional digits, strips trailing zeros
/// and the point, and folds `-0` into `0`.
pub fn number_to_str(value: f64) -> String {
    strip_fraction(format!("{:.*}", NUMBER_PRECISION, value))
}

/// Format a number for function, shading and pattern dictionaries.
///
/// Same as [`number_to_str`] but with [`FUNCTION_PRECISION`] digits, and
/// magnitudes below `1e-12` are treated as zero.
pub fn format_number(value: f64) -> String {
    let value = if value.abs() < 1e-12 { 0.0 } else { value };
    strip_fraction(format!("{:.*}", FUNCTION_PRECISION, value))
}

/// Join formatted numbers with single spaces.
pub fn join_numbers(values: &[f64], fmt: fn(f64) -> String) -> String {
    values.iter().map(|&v| fmt(v)).collect::<Vec<_>>().join(" ")
}

/// Validate that `value` lies in `[minimum, maximum]`.
///
/// `name` identifies the offending quantity in the error.
pub fn check_range(name: &'static str, value: f64, minimum: f64, maximum: f64) -> Result<f64> {
    if !(minimum..=maximum).contains(&value) {
        return Err(Error::OutOfRange { name, value });
    }
    Ok(value)
}

/// Validate a unit-interval quantity such as a color component or opacity.
#[inline]
pub fn check_unit(name: &'static str, value: f64) -> Result<f64> {
    check_range(name, value, 0.0, 1.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_str_integer() {
        assert_eq!(number_to_str(100.0), "100");
        assert_eq!(number_to_str(0.0), "0");
    }

    #[test]
    fn test_number_to_str_fraction() {
        assert_eq!(number_to_str(1.05), "1.05");
        assert_eq!(number_to_str(1.1), "1.1");
        assert_eq!(number_to_str(123.456), "123.456");
    }

    #[test]
    fn test_number_to_str_truncates() {
        assert_eq!(number_to_str(10.00001), "10");
        assert_eq!(number_to_str(0.000008), "0");
        assert_eq!(number_to_str(-1.12345), "-1.1235");
    }

    #[test]
    fn test_number_to_str_negative_zero() {
        assert_eq!(number_to_str(-0.00004), "0");
        assert_eq!(number_to_str(-0.0), "0");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.33333333");
        assert_eq!(format_number(-1e-13), "0");
        assert_eq!(format_number(2.0), "2");
    }

    #[test]
    fn test_join_numbers() {
        assert_eq!(join_numbers(&[1.0, 0.5, -2.25], number_to_str), "1 0.5 -2.25");
        assert_eq!(join_numbers(&[], number_to_str), "");
    }

    #[test]
    fn test_check_range() {
        assert_eq!(check_unit("r", 0.5).unwrap(), 0.5);
        assert!(check_unit("r", 1.5).is_err());
        assert!(check_unit("r", -0.1).is_err());
        assert!(check_unit("r", f64::NAN).is_err());
        assert!(check_range("w", 3.0, 0.0, 10.0).is_ok());
    }

    #[test]
    fn test_deg2rad() {
        assert!((deg2rad(180.0) - PI).abs() < 1e-12);
        assert!((rad2deg(PI / 2.0) - 90.0).abs() < 1e-12);
    }
}
