//! Comparison Module
//!
//! Working-vs-reference formulas per comparison kind, each returning the
//! derived values from which a pass/fail verdict follows. Inputs that cannot
//! be evaluated surface as [`ComparisonError`], which maps to
//! [`Verdict::Indeterminate`].

pub mod balance;
pub mod hydrometer;
pub mod karl_fischer;
pub mod tape;
pub mod temperature;

pub use balance::{compare_balance, BalanceComparison, BalanceInput};
pub use hydrometer::{
    compare_hydrometer, compare_with, recheck, CorrectionRequest, HydrometerComparison, HydrometerInput,
    HydrometerSide, HydrometerSideInput,
};
pub use karl_fischer::{
    compare_karl_fischer, KarlFischerComparison, KarlFischerInput, KarlFischerTrial,
    KarlFischerTrialInput,
};
pub use tape::{compare_tape, TapeComparison, TapeInput};
pub use temperature::{
    compare_monthly_temperature, compare_temperature, MonthlyTemperatureComparison,
    MonthlyTemperatureInput, TemperatureComparison, TemperatureInput,
};

use serde::{Deserialize, Serialize};

use crate::error::ComparisonError;
use crate::model::{ComparisonKind, EquipmentType, Verdict};

/// Fixed engineering tolerances
pub mod limits {
    /// °F, inclusive
    pub const TEMPERATURE_F: f64 = 0.5;
    /// mm, exclusive
    pub const TAPE_MM: f64 = 2.0;
    /// °API at 60 °F, inclusive
    pub const API_60F: f64 = 0.5;
    pub const KF_FACTOR_MIN: f64 = 4.5;
    pub const KF_FACTOR_MAX: f64 = 5.5;
    /// %, exclusive
    pub const KF_RELATIVE_ERROR_PCT: f64 = 2.0;
}

// Absorbs representation error from unit conversion on inclusive bounds
const INCLUSIVE_SLACK: f64 = 1e-9;

pub(crate) fn within(diff: f64, limit: f64) -> bool {
    diff.abs() <= limit + INCLUSIVE_SLACK
}

pub(crate) fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min - INCLUSIVE_SLACK && value <= max + INCLUSIVE_SLACK
}

/// Inputs for any comparison kind
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonInput {
    Temperature(TemperatureInput),
    MonthlyTemperature(MonthlyTemperatureInput),
    Tape(TapeInput),
    Balance(BalanceInput),
    /// Corrected API-60F values must already be resolved (`None` = unavailable)
    Hydrometer {
        input: HydrometerInput,
        work_api60f: Option<f64>,
        reference_api60f: Option<f64>,
    },
    KarlFischer(KarlFischerInput),
}

impl ComparisonInput {
    pub fn kind(&self) -> ComparisonKind {
        match self {
            ComparisonInput::Temperature(_) => ComparisonKind::Temperature,
            ComparisonInput::MonthlyTemperature(_) => ComparisonKind::MonthlyTemperature,
            ComparisonInput::Tape(_) => ComparisonKind::Tape,
            ComparisonInput::Balance(_) => ComparisonKind::Balance,
            ComparisonInput::Hydrometer { .. } => ComparisonKind::Hydrometer,
            ComparisonInput::KarlFischer(_) => ComparisonKind::KarlFischer,
        }
    }
}

/// Derived values of a completed comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ComparisonResult {
    Temperature(TemperatureComparison),
    MonthlyTemperature(MonthlyTemperatureComparison),
    Tape(TapeComparison),
    Balance(BalanceComparison),
    Hydrometer(HydrometerComparison),
    KarlFischer(KarlFischerComparison),
}

impl ComparisonResult {
    pub fn kind(&self) -> ComparisonKind {
        match self {
            ComparisonResult::Temperature(_) => ComparisonKind::Temperature,
            ComparisonResult::MonthlyTemperature(_) => ComparisonKind::MonthlyTemperature,
            ComparisonResult::Tape(_) => ComparisonKind::Tape,
            ComparisonResult::Balance(_) => ComparisonKind::Balance,
            ComparisonResult::Hydrometer(_) => ComparisonKind::Hydrometer,
            ComparisonResult::KarlFischer(_) => ComparisonKind::KarlFischer,
        }
    }

    pub fn passes(&self) -> bool {
        match self {
            ComparisonResult::Temperature(c) => c.passes(),
            ComparisonResult::MonthlyTemperature(c) => c.passes(),
            ComparisonResult::Tape(c) => c.passes(),
            ComparisonResult::Balance(c) => c.passes(),
            ComparisonResult::Hydrometer(c) => c.passes(),
            ComparisonResult::KarlFischer(c) => c.passes(),
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_bool(self.passes())
    }
}

/// Run the formula matching the input
pub fn evaluate(input: &ComparisonInput) -> Result<ComparisonResult, ComparisonError> {
    Ok(match input {
        ComparisonInput::Temperature(i) => ComparisonResult::Temperature(compare_temperature(i)?),
        ComparisonInput::MonthlyTemperature(i) => {
            ComparisonResult::MonthlyTemperature(compare_monthly_temperature(i)?)
        }
        ComparisonInput::Tape(i) => ComparisonResult::Tape(compare_tape(i)?),
        ComparisonInput::Balance(i) => ComparisonResult::Balance(compare_balance(i)?),
        ComparisonInput::Hydrometer { input, work_api60f, reference_api60f } => {
            ComparisonResult::Hydrometer(compare_hydrometer(input, *work_api60f, *reference_api60f)?)
        }
        ComparisonInput::KarlFischer(i) => ComparisonResult::KarlFischer(compare_karl_fischer(i)?),
    })
}

/// Evaluate for a specific equipment type and verification frequency.
///
/// Rejects inputs whose kind does not match what the type's category calls for.
pub fn evaluate_for(
    equipment_type: &EquipmentType,
    frequency_days: i64,
    input: &ComparisonInput,
) -> Result<ComparisonResult, ComparisonError> {
    let expected = ComparisonKind::for_verification(equipment_type.category, equipment_type.role, frequency_days)?;
    if expected != input.kind() {
        return Err(ComparisonError::UnsupportedCategory(format!(
            "{:?} comparison requested for {} `{}` (expects {:?})",
            input.kind(),
            equipment_type.category.label(),
            equipment_type.name,
            expected
        )));
    }
    evaluate(input)
}

/// Tri-state verdict of a comparison attempt
pub fn verdict_of(result: &Result<ComparisonResult, ComparisonError>) -> Verdict {
    Verdict::of(result, ComparisonResult::passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Measure, Role};

    fn thermometer() -> EquipmentType {
        EquipmentType::new("t", "Termómetro digital", Role::Working, [Measure::Temperature], 1, 365)
    }

    fn single(under: Option<f64>) -> ComparisonInput {
        ComparisonInput::Temperature(TemperatureInput {
            under,
            under_unit: "F".into(),
            reference: Some(70.0),
            reference_unit: "F".into(),
        })
    }

    #[test]
    fn test_tri_state() {
        assert_eq!(verdict_of(&evaluate(&single(Some(70.2)))), Verdict::Pass);
        assert_eq!(verdict_of(&evaluate(&single(Some(71.0)))), Verdict::Fail);
        assert_eq!(verdict_of(&evaluate(&single(None))), Verdict::Indeterminate);
    }

    #[test]
    fn test_evaluate_for_checks_category() {
        assert!(evaluate_for(&thermometer(), 1, &single(Some(70.1))).is_ok());

        let monthly = evaluate_for(&thermometer(), 30, &single(Some(70.1)));
        assert!(matches!(monthly, Err(ComparisonError::UnsupportedCategory(_))));

        let gauge = EquipmentType::new("p", "Manómetro", Role::Working, [Measure::Pressure], 1, 365);
        assert!(matches!(
            evaluate_for(&gauge, 1, &single(Some(70.1))),
            Err(ComparisonError::UnsupportedCategory(_))
        ));
    }

    #[test]
    fn test_celsius_inclusive_edge() {
        // 0.5 °F expressed through a Celsius conversion
        let input = ComparisonInput::Temperature(TemperatureInput {
            under: Some(21.0 + 0.5 * 5.0 / 9.0),
            under_unit: "C".into(),
            reference: Some(21.0),
            reference_unit: "C".into(),
        });
        assert_eq!(verdict_of(&evaluate(&input)), Verdict::Pass);
    }
}
