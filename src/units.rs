//! Unit conversion at the HTTP boundary.
//!
//! Not a general unit library: exactly the conversions `pack()`'s callers
//! need to get item/box measurements into the centimeter/gram space the
//! core engine works in.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Length unit accepted on item/box dimension fields.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DimensionUnit {
    #[default]
    Centimeters,
    Inches,
    Millimeters,
}

impl DimensionUnit {
    /// Multiplier to convert a value in this unit to centimeters.
    pub fn to_cm_factor(self) -> f64 {
        match self {
            DimensionUnit::Centimeters => 1.0,
            DimensionUnit::Inches => 2.54,
            DimensionUnit::Millimeters => 0.1,
        }
    }

    pub fn to_cm(self, value: f64) -> f64 {
        value * self.to_cm_factor()
    }
}

/// Mass unit accepted on item/box weight fields.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MassUnit {
    #[default]
    Grams,
    Kilograms,
    Pounds,
}

impl MassUnit {
    /// Multiplier to convert a value in this unit to grams.
    pub fn to_g_factor(self) -> f64 {
        match self {
            MassUnit::Grams => 1.0,
            MassUnit::Kilograms => 1_000.0,
            MassUnit::Pounds => 453.592,
        }
    }

    pub fn to_g(self, value: f64) -> f64 {
        value * self.to_g_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centimeters_and_grams_are_identity() {
        assert!((DimensionUnit::Centimeters.to_cm(12.5) - 12.5).abs() < 1e-9);
        assert!((MassUnit::Grams.to_g(42.0) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn inches_convert_to_centimeters() {
        assert!((DimensionUnit::Inches.to_cm(1.0) - 2.54).abs() < 1e-9);
    }

    #[test]
    fn pounds_convert_to_grams() {
        assert!((MassUnit::Pounds.to_g(1.0) - 453.592).abs() < 1e-6);
    }
}
