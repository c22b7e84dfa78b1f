//! Balance comparisons against a reference weight

use serde::{Deserialize, Serialize};

use super::within;
use crate::error::ComparisonError;
use crate::model::Equipment;
use crate::units::{MassUnit, Measured};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceInput {
    pub reading: Option<f64>,
    pub reading_unit: String,
    pub nominal: Option<f64>,
    pub nominal_unit: String,
    /// ± band in grams
    pub emp_g: Option<f64>,
}

impl BalanceInput {
    /// Fill the nominal mass and EMP from the reference weight's record
    pub fn against(reference: &Equipment, reading: Option<f64>, reading_unit: impl Into<String>) -> Self {
        Self {
            reading,
            reading_unit: reading_unit.into(),
            nominal: reference.nominal_mass_value,
            nominal_unit: reference
                .nominal_mass_unit
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "g".to_string()),
            emp_g: reference.reference_emp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceComparison {
    pub weight: Measured<MassUnit>,
    pub reading: Measured<MassUnit>,
    /// Weight minus balance reading, grams
    pub diff_g: f64,
    pub emp_g: f64,
}

impl BalanceComparison {
    pub fn passes(&self) -> bool {
        within(self.diff_g, self.emp_g)
    }
}

pub fn compare_balance(input: &BalanceInput) -> Result<BalanceComparison, ComparisonError> {
    let reading_unit = MassUnit::parse(&input.reading_unit)
        .ok_or_else(|| ComparisonError::UnsupportedUnit(input.reading_unit.clone()))?;
    let nominal_unit = MassUnit::parse(&input.nominal_unit)
        .ok_or_else(|| ComparisonError::UnsupportedUnit(input.nominal_unit.clone()))?;

    let reading = input
        .reading
        .filter(|v| v.is_finite())
        .ok_or(ComparisonError::MissingReading("balance reading"))?;
    let nominal = input
        .nominal
        .filter(|v| v.is_finite())
        .ok_or(ComparisonError::MissingReading("reference weight"))?;
    let emp_g = input
        .emp_g
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or(ComparisonError::MissingEmp)?;

    Ok(BalanceComparison {
        weight: Measured::new(nominal, nominal_unit),
        reading: Measured::new(reading, reading_unit),
        diff_g: nominal_unit.to_grams(nominal) - reading_unit.to_grams(reading),
        emp_g,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EquipmentType, Measure, Role};

    fn f1_100g() -> Equipment {
        let ty = EquipmentType::new("w", "Pesa patrón", Role::Reference, [Measure::Weight], 0, 365);
        let mut weight = Equipment::new("ref-w", ty);
        weight.nominal_mass_value = Some(100.0);
        weight.weight_class = Some("F1".into());
        weight
    }

    #[test]
    fn test_table_emp_pass_and_fail() {
        let weight = f1_100g();
        let pass = compare_balance(&BalanceInput::against(&weight, Some(100.0003), "g")).unwrap();
        assert!((pass.diff_g + 0.0003).abs() < 1e-9);
        assert!(pass.passes());

        let fail = compare_balance(&BalanceInput::against(&weight, Some(100.0008), "g")).unwrap();
        assert!((fail.diff_g + 0.0008).abs() < 1e-9);
        assert!(!fail.passes());
    }

    #[test]
    fn test_reading_in_milligrams() {
        let weight = f1_100g();
        let result = compare_balance(&BalanceInput::against(&weight, Some(100_000.2), "mg")).unwrap();
        assert!((result.diff_g + 0.0002).abs() < 1e-9);
        assert!(result.passes());
    }

    #[test]
    fn test_emp_uses_exact_difference() {
        let input = |reading: f64| BalanceInput {
            reading: Some(reading),
            reading_unit: "g".into(),
            nominal: Some(100.0),
            nominal_unit: "g".into(),
            emp_g: Some(0.0001),
        };
        let over = compare_balance(&input(99.9998996)).unwrap();
        assert!(over.diff_g > 0.0001);
        assert!(!over.passes());

        let inside = compare_balance(&input(99.9999004)).unwrap();
        assert!(inside.passes());
    }

    #[test]
    fn test_missing_emp_is_indeterminate() {
        let mut weight = f1_100g();
        weight.weight_class = None;
        let input = BalanceInput::against(&weight, Some(100.0), "g");
        assert_eq!(compare_balance(&input), Err(ComparisonError::MissingEmp));
    }
}
