//! Reference Weight EMP Table
//!
//! Maximum permissible errors (OIML R 111) for the reference weights the lab
//! holds, tabulated in milligrams and served in grams.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy class of a reference weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightClass {
    E1,
    E2,
    F1,
    F2,
    M1,
    M2,
    M3,
}

impl WeightClass {
    pub const ALL: [WeightClass; 7] = [
        WeightClass::E1,
        WeightClass::E2,
        WeightClass::F1,
        WeightClass::F2,
        WeightClass::M1,
        WeightClass::M2,
        WeightClass::M3,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "E1" => Some(Self::E1),
            "E2" => Some(Self::E2),
            "F1" => Some(Self::F1),
            "F2" => Some(Self::F2),
            "M1" => Some(Self::M1),
            "M2" => Some(Self::M2),
            "M3" => Some(Self::M3),
            _ => None,
        }
    }

    fn column(self) -> usize {
        self as usize
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Nominal masses (g) covered by the table
pub const NOMINAL_GRAMS: [f64; 8] = [1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0];

// mg, columns E1 E2 F1 F2 M1 M2 M3
const EMP_MG: [[f64; 7]; 8] = [
    [0.010, 0.03, 0.10, 0.3, 1.0, 3.0, 10.0],
    [0.012, 0.04, 0.12, 0.4, 1.2, 4.0, 12.0],
    [0.016, 0.05, 0.16, 0.5, 1.6, 5.0, 16.0],
    [0.020, 0.06, 0.20, 0.6, 2.0, 6.0, 20.0],
    [0.025, 0.08, 0.25, 0.8, 2.5, 8.0, 25.0],
    [0.030, 0.10, 0.30, 1.0, 3.0, 10.0, 30.0],
    [0.050, 0.16, 0.50, 1.6, 5.0, 16.0, 50.0],
    [0.100, 0.30, 1.00, 3.0, 10.0, 30.0, 100.0],
];

/// EMP in grams for a nominal mass (g) and class, `None` outside the table
pub fn get_weight_emp(nominal_grams: f64, class: WeightClass) -> Option<f64> {
    let row = NOMINAL_GRAMS
        .iter()
        .position(|n| (n - nominal_grams).abs() < 1e-9)?;
    Some(EMP_MG[row][class.column()] / 1000.0)
}

/// Same lookup from raw text, as stored on equipment records
pub fn get_weight_emp_str(nominal_grams: f64, class: &str) -> Option<f64> {
    WeightClass::parse(class).and_then(|c| get_weight_emp(nominal_grams, c))
}
