//! History records: inspections, verifications, calibrations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::category::Cadence;
use super::verdict::Verdict;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    #[serde(default)]
    pub id: Option<String>,
    pub inspected_at: DateTime<Utc>,
    #[serde(default)]
    pub is_ok: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Inspection {
    pub fn new(inspected_at: DateTime<Utc>, is_ok: Option<bool>) -> Self {
        Self { id: None, inspected_at, is_ok, notes: None }
    }
}

/// Structured reading columns stored on a verification row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReadings {
    #[serde(default)]
    pub reading_under_test_high: Option<f64>,
    #[serde(default)]
    pub reading_under_test_mid: Option<f64>,
    #[serde(default)]
    pub reading_under_test_low: Option<f64>,
    #[serde(default)]
    pub reference_reading_high: Option<f64>,
    #[serde(default)]
    pub reference_reading_mid: Option<f64>,
    #[serde(default)]
    pub reference_reading_low: Option<f64>,
    #[serde(default)]
    pub under_test_unit: Option<String>,
    #[serde(default)]
    pub reference_unit: Option<String>,
}

impl StructuredReadings {
    /// (under test, reference) pairs in high/mid/low order
    pub fn pairs(&self) -> [(Option<f64>, Option<f64>); 3] {
        [
            (self.reading_under_test_high, self.reference_reading_high),
            (self.reading_under_test_mid, self.reference_reading_mid),
            (self.reading_under_test_low, self.reference_reading_low),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().iter().all(|(u, r)| u.is_none() && r.is_none())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(default)]
    pub id: Option<String>,
    pub verification_type_id: String,
    #[serde(default)]
    pub frequency_days: i64,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_ok: Option<bool>,
    #[serde(default)]
    pub reference_equipment_id: Option<String>,
    #[serde(flatten)]
    pub readings: StructuredReadings,
    /// Human-readable notes, possibly carrying a legacy comparison block
    #[serde(default)]
    pub notes: Option<String>,
    /// Versioned tagged comparison payload
    #[serde(default)]
    pub comparison: Option<String>,
}

impl Verification {
    pub fn new(verification_type_id: impl Into<String>, frequency_days: i64, verified_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            verification_type_id: verification_type_id.into(),
            frequency_days,
            verified_at: Some(verified_at),
            is_ok: None,
            reference_equipment_id: None,
            readings: StructuredReadings::default(),
            notes: None,
            comparison: None,
        }
    }

    pub fn cadence(&self) -> Cadence {
        Cadence::from_days(self.frequency_days)
    }
}

/// Catalog entry describing one kind of verification for an equipment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationType {
    pub id: String,
    pub name: String,
    pub frequency_days: i64,
    #[serde(default)]
    pub order: i32,
}

impl VerificationType {
    pub fn cadence(&self) -> Cadence {
        Cadence::from_days(self.frequency_days)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    #[serde(default)]
    pub point_label: String,
    #[serde(default)]
    pub reference_value: Option<f64>,
    #[serde(default)]
    pub measured_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub error_value: Option<f64>,
    #[serde(default)]
    pub tolerance_value: Option<f64>,
    /// Category-specific columns (uncertainty, coverage factor, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CalibrationResult {
    /// Stored error, else measured minus reference
    pub fn error(&self) -> Option<f64> {
        self.error_value
            .or_else(|| Some(self.measured_value? - self.reference_value?))
            .filter(|e| e.is_finite())
    }

    pub fn within_tolerance(&self) -> Verdict {
        match (self.error(), self.tolerance_value) {
            (Some(error), Some(tolerance)) => Verdict::from_bool(error.abs() <= tolerance.abs() + 1e-12),
            _ => Verdict::Indeterminate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    #[serde(default)]
    pub id: Option<String>,
    pub calibrated_at: DateTime<Utc>,
    #[serde(default)]
    pub calibration_company_id: Option<String>,
    #[serde(default)]
    pub calibration_company_name: Option<String>,
    #[serde(default)]
    pub certificate_number: Option<String>,
    #[serde(default)]
    pub results: Vec<CalibrationResult>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Calibration {
    pub fn new(calibrated_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            calibrated_at,
            calibration_company_id: None,
            calibration_company_name: None,
            certificate_number: None,
            results: Vec::new(),
            notes: None,
        }
    }

    /// Worst verdict over every result row; indeterminate with no rows
    pub fn all_within_tolerance(&self) -> Verdict {
        self.results
            .iter()
            .map(CalibrationResult::within_tolerance)
            .reduce(Verdict::join)
            .unwrap_or(Verdict::Indeterminate)
    }
}
