//! Tape measure comparisons: averaged readings per side, in millimeters

use serde::{Deserialize, Serialize};

use super::limits;
use crate::error::ComparisonError;
use crate::units::LengthUnit;

const MIN_READINGS: usize = 2;
const MAX_READINGS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TapeInput {
    pub under: Vec<Option<f64>>,
    pub under_unit: String,
    pub reference: Vec<Option<f64>>,
    pub reference_unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeComparison {
    pub under: Vec<f64>,
    pub under_unit: LengthUnit,
    pub reference: Vec<f64>,
    pub reference_unit: LengthUnit,
    pub avg_under_mm: f64,
    pub avg_reference_mm: f64,
    /// Reference average minus under-test average
    pub diff_mm: f64,
}

impl TapeComparison {
    pub fn passes(&self) -> bool {
        self.diff_mm.abs() < limits::TAPE_MM
    }
}

/// Numeric readings of one side, validated for count and paired equality.
///
/// Exactly two readings must agree with each other; a third reading lifts
/// that requirement.
pub fn validate_side(side: &'static str, readings: &[Option<f64>]) -> Result<Vec<f64>, ComparisonError> {
    let values: Vec<f64> = readings
        .iter()
        .filter_map(|r| r.filter(|v| v.is_finite()))
        .collect();

    if values.len() < MIN_READINGS {
        return Err(ComparisonError::InsufficientReadings {
            side,
            required: MIN_READINGS,
            found: values.len(),
        });
    }
    if values.len() > MAX_READINGS {
        return Err(ComparisonError::TooManyReadings {
            side,
            max: MAX_READINGS,
            found: values.len(),
        });
    }
    if values.len() == 2 && (values[0] - values[1]).abs() > 1e-9 {
        return Err(ComparisonError::UnequalPairedReadings {
            side,
            first: values[0],
            second: values[1],
        });
    }
    Ok(values)
}

fn average_mm(values: &[f64], unit: LengthUnit) -> f64 {
    values.iter().map(|v| unit.to_millimeters(*v)).sum::<f64>() / values.len() as f64
}

pub fn compare_tape(input: &TapeInput) -> Result<TapeComparison, ComparisonError> {
    let under_unit = LengthUnit::parse(&input.under_unit)
        .ok_or_else(|| ComparisonError::UnsupportedUnit(input.under_unit.clone()))?;
    let reference_unit = LengthUnit::parse(&input.reference_unit)
        .ok_or_else(|| ComparisonError::UnsupportedUnit(input.reference_unit.clone()))?;

    let under = validate_side("under test", &input.under)?;
    let reference = validate_side("reference", &input.reference)?;

    let avg_under = average_mm(&under, under_unit);
    let avg_reference = average_mm(&reference, reference_unit);

    Ok(TapeComparison {
        under,
        under_unit,
        reference,
        reference_unit,
        avg_under_mm: avg_under,
        avg_reference_mm: avg_reference,
        diff_mm: avg_reference - avg_under,
    })
}
