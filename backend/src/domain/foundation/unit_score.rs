//! Unit score value object (0.0 to 1.0 inclusive).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A finite value between 0.0 and 1.0 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitScore(f64);

impl UnitScore {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    /// Creates a score, clamping into range. NaN becomes zero.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Creates a score, rejecting NaN, infinities and out-of-range values.
    pub fn try_new(field: &str, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::out_of_range(field, 0.0, 1.0, value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for UnitScore {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for UnitScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_accepts_bounds() {
        assert!(UnitScore::try_new("x", 0.0).is_ok());
        assert!(UnitScore::try_new("x", 1.0).is_ok());
    }

    #[test]
    fn try_new_rejects_out_of_range_and_nan() {
        assert!(UnitScore::try_new("x", 1.01).is_err());
        assert!(UnitScore::try_new("x", -0.01).is_err());
        assert!(UnitScore::try_new("x", f64::NAN).is_err());
        assert!(UnitScore::try_new("x", f64::INFINITY).is_err());
    }

    #[test]
    fn try_new_reports_field() {
        match UnitScore::try_new("complexity", 2.0) {
            Err(ValidationError::OutOfRange { field, actual, .. }) => {
                assert_eq!(field, "complexity");
                assert_eq!(actual, 2.0);
            }
            other => panic!("Expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn clamped_pins_to_range() {
        assert_eq!(UnitScore::clamped(1.7).value(), 1.0);
        assert_eq!(UnitScore::clamped(-3.0).value(), 0.0);
        assert_eq!(UnitScore::clamped(f64::NAN).value(), 0.0);
    }

    #[test]
    fn displays_three_decimals() {
        assert_eq!(format!("{}", UnitScore::clamped(0.5)), "0.500");
    }
}
