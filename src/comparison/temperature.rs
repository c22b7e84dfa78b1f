//! Thermometer comparisons: single reading and monthly three-point

use serde::{Deserialize, Serialize};

use super::{limits, within};
use crate::error::ComparisonError;
use crate::units::{Measured, TemperatureUnit};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureInput {
    pub under: Option<f64>,
    pub under_unit: String,
    pub reference: Option<f64>,
    pub reference_unit: String,
}

/// One working-vs-reference temperature pair, difference in °F
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureComparison {
    pub under: Measured<TemperatureUnit>,
    pub reference: Measured<TemperatureUnit>,
    pub diff_f: f64,
}

impl TemperatureComparison {
    pub fn passes(&self) -> bool {
        within(self.diff_f, limits::TEMPERATURE_F)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyTemperatureInput {
    /// High, mid, low
    pub under: [Option<f64>; 3],
    pub under_unit: String,
    pub reference: [Option<f64>; 3],
    pub reference_unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTemperatureComparison {
    pub high: TemperatureComparison,
    pub mid: TemperatureComparison,
    pub low: TemperatureComparison,
}

impl MonthlyTemperatureComparison {
    pub fn points(&self) -> [&TemperatureComparison; 3] {
        [&self.high, &self.mid, &self.low]
    }

    pub fn passes(&self) -> bool {
        self.points().iter().all(|p| p.passes())
    }
}

fn parse_unit(raw: &str) -> Result<TemperatureUnit, ComparisonError> {
    TemperatureUnit::parse(raw).ok_or_else(|| ComparisonError::UnsupportedUnit(raw.to_string()))
}

fn reading(value: Option<f64>, what: &'static str) -> Result<f64, ComparisonError> {
    value
        .filter(|v| v.is_finite())
        .ok_or(ComparisonError::MissingReading(what))
}

fn pair(
    under: Option<f64>,
    under_unit: TemperatureUnit,
    reference: Option<f64>,
    reference_unit: TemperatureUnit,
    labels: (&'static str, &'static str),
) -> Result<TemperatureComparison, ComparisonError> {
    let under = Measured::new(reading(under, labels.0)?, under_unit);
    let reference = Measured::new(reading(reference, labels.1)?, reference_unit);
    let diff_f = under_unit.to_fahrenheit(under.value) - reference_unit.to_fahrenheit(reference.value);
    Ok(TemperatureComparison { under, reference, diff_f })
}

pub fn compare_temperature(input: &TemperatureInput) -> Result<TemperatureComparison, ComparisonError> {
    let under_unit = parse_unit(&input.under_unit)?;
    let reference_unit = parse_unit(&input.reference_unit)?;
    pair(
        input.under,
        under_unit,
        input.reference,
        reference_unit,
        ("under test", "reference"),
    )
}

pub fn compare_monthly_temperature(
    input: &MonthlyTemperatureInput,
) -> Result<MonthlyTemperatureComparison, ComparisonError> {
    const LABELS: [(&str, &str); 3] = [
        ("high under test", "high reference"),
        ("mid under test", "mid reference"),
        ("low under test", "low reference"),
    ];
    let under_unit = parse_unit(&input.under_unit)?;
    let reference_unit = parse_unit(&input.reference_unit)?;
    let point = |i: usize| {
        pair(input.under[i], under_unit, input.reference[i], reference_unit, LABELS[i])
    };
    Ok(MonthlyTemperatureComparison {
        high: point(0)?,
        mid: point(1)?,
        low: point(2)?,
    })
}
