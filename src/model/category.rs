//! Equipment categories
//!
//! Names and measures of an equipment type are matched once, when the type
//! is loaded, into a closed [`EquipmentCategory`]. Everything downstream
//! dispatches on the enum.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::equipment::{Measure, Role};
use crate::error::ComparisonError;
use crate::utils::text::fold_accents;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Thermometer,
    TapeMeasure,
    Balance,
    ReferenceWeight,
    Hydrometer,
    KarlFischer,
    Other,
}

const NAME_PATTERNS: &[(&[&str], EquipmentCategory)] = &[
    (&["karl fischer", "karl-fischer", "titulador kf"], EquipmentCategory::KarlFischer),
    (&["hidrometro", "hydrometer", "densimetro"], EquipmentCategory::Hydrometer),
    (&["termometro", "thermometer"], EquipmentCategory::Thermometer),
    (&["cinta", "flexometro", "tape"], EquipmentCategory::TapeMeasure),
    (&["balanza", "bascula", "balance", "scale"], EquipmentCategory::Balance),
    (&["pesa", "juego de pesas", "weight"], EquipmentCategory::ReferenceWeight),
];

impl EquipmentCategory {
    /// Resolve the category from an equipment type's name, role and measures.
    ///
    /// The name wins when it is recognised; otherwise the measured quantities
    /// decide.
    pub fn resolve(name: &str, role: Role, measures: &BTreeSet<Measure>) -> Self {
        let folded = fold_accents(name);
        for (needles, category) in NAME_PATTERNS {
            if needles.iter().any(|n| folded.contains(n)) {
                return *category;
            }
        }

        if measures.contains(&Measure::PercentPv) {
            EquipmentCategory::KarlFischer
        } else if measures.contains(&Measure::Api) {
            EquipmentCategory::Hydrometer
        } else if measures.contains(&Measure::Weight) {
            match role {
                Role::Reference => EquipmentCategory::ReferenceWeight,
                Role::Working => EquipmentCategory::Balance,
            }
        } else if measures.contains(&Measure::Length) {
            EquipmentCategory::TapeMeasure
        } else if measures.contains(&Measure::Temperature) && !measures.contains(&Measure::RelativeHumidity) {
            EquipmentCategory::Thermometer
        } else {
            EquipmentCategory::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EquipmentCategory::Thermometer => "thermometer",
            EquipmentCategory::TapeMeasure => "tape measure",
            EquipmentCategory::Balance => "balance",
            EquipmentCategory::ReferenceWeight => "reference weight",
            EquipmentCategory::Hydrometer => "hydrometer",
            EquipmentCategory::KarlFischer => "karl fischer titrator",
            EquipmentCategory::Other => "other",
        }
    }
}

/// How often a verification type recurs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Daily,
    Monthly,
    Every(i64),
}

impl Cadence {
    pub fn from_days(frequency_days: i64) -> Self {
        match frequency_days {
            1 => Cadence::Daily,
            30 => Cadence::Monthly,
            n => Cadence::Every(n),
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Cadence::Daily => 1,
            Cadence::Monthly => 30,
            Cadence::Every(n) => n,
        }
    }
}

/// The six comparison formulas a verification can use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    Temperature,
    MonthlyTemperature,
    Tape,
    Balance,
    Hydrometer,
    KarlFischer,
}

impl ComparisonKind {
    /// Pick the comparison for a working instrument's verification
    pub fn for_verification(
        category: EquipmentCategory,
        role: Role,
        frequency_days: i64,
    ) -> Result<Self, ComparisonError> {
        if role == Role::Reference {
            return Err(ComparisonError::UnsupportedCategory(format!(
                "{} instruments are references and are not verified",
                category.label()
            )));
        }
        match category {
            EquipmentCategory::Thermometer => match Cadence::from_days(frequency_days) {
                Cadence::Monthly => Ok(ComparisonKind::MonthlyTemperature),
                _ => Ok(ComparisonKind::Temperature),
            },
            EquipmentCategory::TapeMeasure => Ok(ComparisonKind::Tape),
            EquipmentCategory::Balance => Ok(ComparisonKind::Balance),
            EquipmentCategory::Hydrometer => Ok(ComparisonKind::Hydrometer),
            EquipmentCategory::KarlFischer => Ok(ComparisonKind::KarlFischer),
            EquipmentCategory::ReferenceWeight | EquipmentCategory::Other => Err(
                ComparisonError::UnsupportedCategory(category.label().to_string()),
            ),
        }
    }
}
