//! New-verification payloads built from computed comparisons

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{compose_notes, tagged, ComparisonNote};
use crate::comparison::ComparisonResult;
use crate::error::EngineError;
use crate::model::{StructuredReadings, Verification};

/// Persistable shape of a verification before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDraft {
    pub verification_type_id: String,
    pub frequency_days: i64,
    pub verified_at: DateTime<Utc>,
    pub is_ok: bool,
    pub reference_equipment_id: String,
    #[serde(flatten)]
    pub readings: StructuredReadings,
    pub notes: String,
    pub comparison: String,
}

fn readings_of(result: &ComparisonResult) -> StructuredReadings {
    match result {
        // Single readings go into the high columns
        ComparisonResult::Temperature(t) => StructuredReadings {
            reading_under_test_high: Some(t.under.value),
            reference_reading_high: Some(t.reference.value),
            under_test_unit: Some(t.under.unit.symbol().to_string()),
            reference_unit: Some(t.reference.unit.symbol().to_string()),
            ..Default::default()
        },
        ComparisonResult::MonthlyTemperature(m) => StructuredReadings {
            reading_under_test_high: Some(m.high.under.value),
            reading_under_test_mid: Some(m.mid.under.value),
            reading_under_test_low: Some(m.low.under.value),
            reference_reading_high: Some(m.high.reference.value),
            reference_reading_mid: Some(m.mid.reference.value),
            reference_reading_low: Some(m.low.reference.value),
            under_test_unit: Some(m.high.under.unit.symbol().to_string()),
            reference_unit: Some(m.high.reference.unit.symbol().to_string()),
        },
        _ => StructuredReadings::default(),
    }
}

impl VerificationDraft {
    pub fn from_comparison(
        verification_type_id: impl Into<String>,
        frequency_days: i64,
        verified_at: DateTime<Utc>,
        note: &ComparisonNote,
        free_text: Option<&str>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            verification_type_id: verification_type_id.into(),
            frequency_days,
            verified_at,
            is_ok: note.result.verdict().is_pass(),
            reference_equipment_id: note.reference_id.clone(),
            readings: readings_of(&note.result),
            notes: compose_notes(free_text, note),
            comparison: tagged::encode(note)?,
        })
    }

    pub fn into_verification(self, id: impl Into<String>) -> Verification {
        Verification {
            id: Some(id.into()),
            verification_type_id: self.verification_type_id,
            frequency_days: self.frequency_days,
            verified_at: Some(self.verified_at),
            is_ok: Some(self.is_ok),
            reference_equipment_id: Some(self.reference_equipment_id),
            readings: self.readings,
            notes: Some(self.notes),
            comparison: Some(self.comparison),
        }
    }
}
