//! Karl Fischer titrant factor checks

use serde::{Deserialize, Serialize};

use super::{in_range, limits};
use crate::error::ComparisonError;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KarlFischerTrialInput {
    pub weight_mg: Option<f64>,
    pub volume_ml: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KarlFischerInput {
    pub trials: [KarlFischerTrialInput; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KarlFischerTrial {
    pub weight_mg: f64,
    pub volume_ml: f64,
    /// mg of water per mL of titrant
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KarlFischerComparison {
    pub trials: [KarlFischerTrial; 2],
    pub average_factor: f64,
    pub relative_error_pct: f64,
}

impl KarlFischerComparison {
    pub fn factors_in_range(&self) -> bool {
        self.trials
            .iter()
            .all(|t| in_range(t.factor, limits::KF_FACTOR_MIN, limits::KF_FACTOR_MAX))
    }

    pub fn passes(&self) -> bool {
        self.factors_in_range() && self.relative_error_pct < limits::KF_RELATIVE_ERROR_PCT
    }
}

const TRIAL_LABELS: [(&str, &str); 2] = [("weight 1", "volume 1"), ("weight 2", "volume 2")];

pub fn compare_karl_fischer(input: &KarlFischerInput) -> Result<KarlFischerComparison, ComparisonError> {
    let mut raw = [(0.0, 0.0, 0.0); 2];
    for (i, trial) in input.trials.iter().enumerate() {
        let (weight_label, volume_label) = TRIAL_LABELS[i];
        let weight = trial
            .weight_mg
            .filter(|v| v.is_finite())
            .ok_or(ComparisonError::MissingReading(weight_label))?;
        let volume = trial
            .volume_ml
            .filter(|v| v.is_finite())
            .ok_or(ComparisonError::MissingReading(volume_label))?;
        if volume == 0.0 {
            return Err(ComparisonError::ZeroVolume);
        }
        raw[i] = (weight, volume, weight / volume);
    }

    let (f1, f2) = (raw[0].2, raw[1].2);
    let average = (f1 + f2) / 2.0;
    if average == 0.0 {
        return Err(ComparisonError::MissingReading("non-zero titrant factor"));
    }
    let relative_error = (f1 - f2).abs() / average * 100.0;

    let trial = |(weight_mg, volume_ml, factor): (f64, f64, f64)| KarlFischerTrial { weight_mg, volume_ml, factor };

    Ok(KarlFischerComparison {
        trials: [trial(raw[0]), trial(raw[1])],
        average_factor: average,
        relative_error_pct: relative_error,
    })
}
