//! Notes Codec
//!
//! Comparison metadata travels in two encodings: a versioned tagged JSON
//! payload ([`tagged`]) and the legacy text grammar embedded in free-text
//! notes ([`legacy`]). Readers prefer the tagged payload and fall back to
//! the legacy grammar; structured reading columns win over both.

pub mod legacy;
pub mod payload;
pub mod tagged;

pub use payload::VerificationDraft;

use serde::{Deserialize, Serialize};

use crate::comparison::{
    compare_monthly_temperature, compare_temperature, ComparisonResult, MonthlyTemperatureInput,
    TemperatureInput,
};
use crate::model::{StructuredReadings, Verification};

/// A comparison result together with the reference instrument it used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonNote {
    pub reference_id: String,
    pub result: ComparisonResult,
}

/// Tagged payload first, then the legacy block in the notes text
pub fn decode_any(comparison: Option<&str>, notes: Option<&str>) -> Option<ComparisonNote> {
    comparison
        .and_then(tagged::decode)
        .or_else(|| notes.and_then(legacy::decode))
}

/// Free text followed by the legacy block on its own line
pub fn compose_notes(free_text: Option<&str>, note: &ComparisonNote) -> String {
    let block = legacy::encode(note);
    match free_text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => format!("{}\n{}", text, block),
        None => block,
    }
}

/// Notes without any machine-generated block
pub fn free_text(notes: &str) -> String {
    legacy::strip_block(notes)
}

const DEFAULT_TEMPERATURE_UNIT: &str = "F";

/// Temperature comparison rebuilt from the structured reading columns.
///
/// Exactly one complete pair gives a single-reading comparison; three
/// complete pairs give the monthly three-point comparison. Any other shape
/// is not structured data.
pub fn from_structured(readings: &StructuredReadings) -> Option<ComparisonResult> {
    let under_unit = readings.under_test_unit.as_deref().unwrap_or(DEFAULT_TEMPERATURE_UNIT);
    let reference_unit = readings.reference_unit.as_deref().unwrap_or(DEFAULT_TEMPERATURE_UNIT);
    let pairs = readings.pairs();
    let complete: Vec<(f64, f64)> = pairs
        .iter()
        .filter_map(|(u, r)| Some(((*u)?, (*r)?)))
        .collect();

    match complete.as_slice() {
        [(under, reference)] => compare_temperature(&TemperatureInput {
            under: Some(*under),
            under_unit: under_unit.to_string(),
            reference: Some(*reference),
            reference_unit: reference_unit.to_string(),
        })
        .ok()
        .map(ComparisonResult::Temperature),
        [_, _, _] => compare_monthly_temperature(&MonthlyTemperatureInput {
            under: pairs.map(|(u, _)| u),
            under_unit: under_unit.to_string(),
            reference: pairs.map(|(_, r)| r),
            reference_unit: reference_unit.to_string(),
        })
        .ok()
        .map(ComparisonResult::MonthlyTemperature),
        _ => None,
    }
}

/// Best available comparison for a stored verification
pub fn decode_verification(verification: &Verification) -> Option<ComparisonNote> {
    let encoded = decode_any(verification.comparison.as_deref(), verification.notes.as_deref());

    match from_structured(&verification.readings) {
        Some(result) => {
            let reference_id = verification
                .reference_equipment_id
                .clone()
                .or_else(|| encoded.map(|n| n.reference_id))
                .unwrap_or_default();
            Some(ComparisonNote { reference_id, result })
        }
        None => encoded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::TemperatureComparison;
    use crate::units::{Measured, TemperatureUnit};
    use chrono::Utc;

    fn temperature_note(reference_id: &str, under: f64) -> ComparisonNote {
        ComparisonNote {
            reference_id: reference_id.into(),
            result: ComparisonResult::Temperature(TemperatureComparison {
                under: Measured::new(under, TemperatureUnit::Fahrenheit),
                reference: Measured::new(70.0, TemperatureUnit::Fahrenheit),
                diff_f: under - 70.0,
            }),
        }
    }

    #[test]
    fn test_tagged_payload_preferred() {
        let tagged_note = temperature_note("tagged", 70.25);
        let legacy_note = temperature_note("legacy", 70.5);
        let payload = tagged::encode(&tagged_note).unwrap();
        let notes = compose_notes(None, &legacy_note);

        assert_eq!(decode_any(Some(&payload), Some(&notes)), Some(tagged_note));
        assert_eq!(decode_any(Some("{broken"), Some(&notes)), Some(legacy_note));
        assert_eq!(decode_any(None, Some("texto libre")), None);
        assert_eq!(decode_any(None, None), None);
    }

    #[test]
    fn test_compose_and_strip() {
        let note = temperature_note("7", 70.25);
        let notes = compose_notes(Some("  Limpieza previa  "), &note);
        assert!(notes.starts_with("Limpieza previa\n"));
        assert_eq!(free_text(&notes), "Limpieza previa");
        assert_eq!(legacy::decode(&notes), Some(note.clone()));
        assert_eq!(compose_notes(Some("   "), &note), legacy::encode(&note));
    }

    #[test]
    fn test_structured_shapes() {
        let mut readings = StructuredReadings {
            reading_under_test_high: Some(70.2),
            reference_reading_high: Some(70.0),
            ..Default::default()
        };
        assert!(matches!(from_structured(&readings), Some(ComparisonResult::Temperature(_))));

        readings.reading_under_test_mid = Some(50.0);
        readings.reference_reading_mid = Some(50.1);
        assert_eq!(from_structured(&readings), None);

        readings.reading_under_test_low = Some(32.0);
        readings.reference_reading_low = Some(32.6);
        match from_structured(&readings) {
            Some(ComparisonResult::MonthlyTemperature(m)) => assert!(!m.passes()),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(from_structured(&StructuredReadings::default()), None);
    }

    #[test]
    fn test_structured_columns_win_over_notes() {
        let mut verification = Verification::new("vt", 1, Utc::now());
        verification.notes = Some(legacy::encode(&temperature_note("ref-1", 70.25)));
        verification.readings.reading_under_test_high = Some(71.0);
        verification.readings.reference_reading_high = Some(70.0);

        let decoded = decode_verification(&verification).unwrap();
        assert_eq!(decoded.reference_id, "ref-1");
        match decoded.result {
            ComparisonResult::Temperature(t) => assert_eq!(t.diff_f, 1.0),
            other => panic!("unexpected {:?}", other),
        }
    }
}
