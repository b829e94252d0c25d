//! Rating scale conversion.
//!
//! Users rate on a 0–10 scale (decimals allowed); the wire carries an
//! integer `rating100` in 0–100.

use crate::defaults::{RATING100_MAX, RATING_SCALE_MAX};

/// Convert a 0–10 rating to the wire scale. Out-of-range input is clamped;
/// NaN maps to 0.
pub fn to_rating100(rating: f64) -> i32 {
    if rating.is_nan() {
        return 0;
    }
    let clamped = rating.clamp(0.0, RATING_SCALE_MAX);
    ((clamped * 10.0).round() as i32).clamp(0, RATING100_MAX)
}

/// Convert a wire rating back to the 0–10 scale.
pub fn from_rating100(rating100: i32) -> f64 {
    f64::from(rating100.clamp(0, RATING100_MAX)) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_rating100_scenarios() {
        assert_eq!(to_rating100(7.5), 75);
        assert_eq!(to_rating100(-3.0), 0);
        assert_eq!(to_rating100(12.0), 100);
    }

    #[test]
    fn test_to_rating100_rounds() {
        assert_eq!(to_rating100(4.26), 43);
        assert_eq!(to_rating100(4.24), 42);
        assert_eq!(to_rating100(0.0), 0);
        assert_eq!(to_rating100(10.0), 100);
    }

    #[test]
    fn test_to_rating100_non_finite() {
        assert_eq!(to_rating100(f64::NAN), 0);
        assert_eq!(to_rating100(f64::INFINITY), 100);
        assert_eq!(to_rating100(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_from_rating100() {
        assert_eq!(from_rating100(75), 7.5);
        assert_eq!(from_rating100(140), 10.0);
        assert_eq!(from_rating100(-5), 0.0);
    }
}
