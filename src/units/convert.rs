//! Unit Conversions
//!
//! Linear conversions into the canonical unit of each measured quantity:
//! degrees Fahrenheit for temperature, millimeters for length, grams for mass.
//! Every entry point is fail-soft: an unknown unit or a non-finite value
//! yields `None`, which callers must read as "cannot evaluate".

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reading paired with the unit it was taken in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measured<U> {
    pub value: f64,
    pub unit: U,
}

impl<U> Measured<U> {
    pub fn new(value: f64, unit: U) -> Self {
        Self { value, unit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C", alias = "c")]
    Celsius,
    #[serde(rename = "F", alias = "f")]
    Fahrenheit,
    #[serde(rename = "K", alias = "k")]
    Kelvin,
    #[serde(rename = "R", alias = "r")]
    Rankine,
}

impl TemperatureUnit {
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_start_matches('°').to_lowercase();
        match cleaned.as_str() {
            "c" | "celsius" => Some(Self::Celsius),
            "f" | "fahrenheit" => Some(Self::Fahrenheit),
            "k" | "kelvin" => Some(Self::Kelvin),
            "r" | "rankine" => Some(Self::Rankine),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
            Self::Kelvin => "K",
            Self::Rankine => "R",
        }
    }

    pub fn to_fahrenheit(self, value: f64) -> f64 {
        match self {
            Self::Fahrenheit => value,
            Self::Celsius => value * 9.0 / 5.0 + 32.0,
            Self::Kelvin => (value - 273.15) * 9.0 / 5.0 + 32.0,
            Self::Rankine => value - 459.67,
        }
    }

    /// Inverse of [`TemperatureUnit::to_fahrenheit`]
    pub fn from_fahrenheit(self, fahrenheit: f64) -> f64 {
        match self {
            Self::Fahrenheit => fahrenheit,
            Self::Celsius => (fahrenheit - 32.0) * 5.0 / 9.0,
            Self::Kelvin => (fahrenheit - 32.0) * 5.0 / 9.0 + 273.15,
            Self::Rankine => fahrenheit + 459.67,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Mm,
    Cm,
    M,
    In,
    Ft,
}

impl LengthUnit {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "mm" => Some(Self::Mm),
            "cm" => Some(Self::Cm),
            "m" => Some(Self::M),
            "in" | "\"" => Some(Self::In),
            "ft" | "'" => Some(Self::Ft),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::M => "m",
            Self::In => "in",
            Self::Ft => "ft",
        }
    }

    /// Millimeters per one of this unit
    pub fn factor(self) -> f64 {
        match self {
            Self::Mm => 1.0,
            Self::Cm => 10.0,
            Self::M => 1000.0,
            Self::In => 25.4,
            Self::Ft => 304.8,
        }
    }

    pub fn to_millimeters(self, value: f64) -> f64 {
        value * self.factor()
    }

    pub fn from_millimeters(self, millimeters: f64) -> f64 {
        millimeters / self.factor()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    G,
    Mg,
    Kg,
}

impl MassUnit {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "g" => Some(Self::G),
            "mg" => Some(Self::Mg),
            "kg" => Some(Self::Kg),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Mg => "mg",
            Self::Kg => "kg",
        }
    }

    /// Grams per one of this unit
    pub fn factor(self) -> f64 {
        match self {
            Self::G => 1.0,
            Self::Mg => 1.0 / 1000.0,
            Self::Kg => 1000.0,
        }
    }

    pub fn to_grams(self, value: f64) -> f64 {
        value * self.factor()
    }

    pub fn from_grams(self, grams: f64) -> f64 {
        grams / self.factor()
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Convert a temperature to °F. `None` for unknown units or non-finite input.
pub fn to_fahrenheit(value: f64, unit: &str) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    TemperatureUnit::parse(unit).map(|u| u.to_fahrenheit(value))
}

/// Convert a length to millimeters. `None` for unknown units or non-finite input.
pub fn to_millimeters(value: f64, unit: &str) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    LengthUnit::parse(unit).map(|u| u.to_millimeters(value))
}

/// Convert a mass to grams. `None` for unknown units or non-finite input.
pub fn to_grams(value: f64, unit: &str) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    MassUnit::parse(unit).map(|u| u.to_grams(value))
}

/// Parse a user-entered decimal, accepting `,` as the decimal separator.
///
/// Strings carrying both `.` and `,` are ambiguous and rejected.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match (trimmed.contains('.'), trimmed.contains(',')) {
        (true, true) => return None,
        (false, true) => trimmed.replacen(',', ".", 1),
        _ => trimmed.to_string(),
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_temperature_conversions() {
        assert_eq!(to_fahrenheit(100.0, "c"), Some(212.0));
        assert_eq!(to_fahrenheit(68.0, "F"), Some(68.0));
        assert!((to_fahrenheit(273.15, "k").unwrap() - 32.0).abs() < EPS);
        assert!((to_fahrenheit(459.67, "R").unwrap()).abs() < EPS);
        assert!((to_fahrenheit(20.0, "°C").unwrap() - 68.0).abs() < EPS);
    }

    #[test]
    fn test_temperature_inverse() {
        for unit in [
            TemperatureUnit::Celsius,
            TemperatureUnit::Fahrenheit,
            TemperatureUnit::Kelvin,
            TemperatureUnit::Rankine,
        ] {
            for v in [-40.0, 0.0, 21.7, 150.25] {
                let back = unit.from_fahrenheit(unit.to_fahrenheit(v));
                assert!((back - v).abs() < EPS, "{unit} {v}");
            }
        }
    }

    #[test]
    fn test_length_and_mass() {
        assert_eq!(to_millimeters(2.0, "cm"), Some(20.0));
        assert_eq!(to_millimeters(1.0, "in"), Some(25.4));
        assert!((to_millimeters(1.0, "ft").unwrap() - 304.8).abs() < EPS);
        assert_eq!(to_millimeters(1.5, "m"), Some(1500.0));
        assert_eq!(to_grams(2.0, "kg"), Some(2000.0));
        assert!((to_grams(500.0, "mg").unwrap() - 0.5).abs() < EPS);
        assert!((LengthUnit::In.from_millimeters(to_millimeters(3.3, "in").unwrap()) - 3.3).abs() < EPS);
        assert!((MassUnit::Mg.from_grams(MassUnit::Mg.to_grams(49.0)) - 49.0).abs() < EPS);
    }

    #[test]
    fn test_fail_soft() {
        assert_eq!(to_fahrenheit(10.0, "x"), None);
        assert_eq!(to_millimeters(10.0, "yd"), None);
        assert_eq!(to_grams(f64::NAN, "g"), None);
        assert_eq!(to_grams(f64::INFINITY, "g"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal(" 12,5 "), Some(12.5));
        assert_eq!(parse_decimal("-0,0003"), Some(-0.0003));
        assert_eq!(parse_decimal("1.000,5"), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
    }
}
