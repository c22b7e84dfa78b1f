//! Control-Chart Builder
//!
//! Turns a verification history into an ordered series of difference values
//! with out-of-control flags. Limits are the fixed engineering tolerances in
//! [`crate::comparison::limits`] and, for balances, the EMP of the reference
//! weight used at each point.

pub mod window;

pub use window::ChartWindow;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::comparison::{limits, within, ComparisonResult};
use crate::error::ComparisonError;
use crate::model::{ComparisonKind, Equipment, EquipmentCategory, Verification};
use crate::notes::{self, legacy};

/// Difference value(s) of one chart point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartValues {
    Single(f64),
    /// High, mid, low
    Triple([f64; 3]),
}

impl ChartValues {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            ChartValues::Single(v) => std::slice::from_ref(v),
            ChartValues::Triple(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub verification_id: Option<String>,
    pub verified_at: DateTime<Utc>,
    /// `dd/mm/YYYY` in the laboratory calendar
    pub date_label: String,
    pub kind: ComparisonKind,
    pub values: ChartValues,
    /// Balance points only, in grams
    pub emp: Option<f64>,
    pub out_of_control: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlChart {
    pub equipment_id: String,
    pub category: EquipmentCategory,
    pub out_of_control_count: usize,
    pub points: Vec<ChartPoint>,
}

impl ControlChart {
    pub fn needs_attention(&self) -> bool {
        self.out_of_control_count > 0
    }
}

/// Comparison kinds that can be charted for a category
fn chartable_kinds(category: EquipmentCategory) -> Result<&'static [ComparisonKind], ComparisonError> {
    match category {
        EquipmentCategory::Thermometer => {
            Ok(&[ComparisonKind::Temperature, ComparisonKind::MonthlyTemperature])
        }
        EquipmentCategory::TapeMeasure => Ok(&[ComparisonKind::Tape]),
        EquipmentCategory::Balance => Ok(&[ComparisonKind::Balance]),
        other => Err(ComparisonError::UnsupportedCategory(format!(
            "no control chart for {}",
            other.label()
        ))),
    }
}

/// Builds the control chart of one instrument from a history snapshot
pub struct ControlChartBuilder<'a> {
    equipment: &'a Equipment,
    kinds: &'static [ComparisonKind],
    calendar: FixedOffset,
    verification_type_id: Option<String>,
    references: HashMap<String, &'a Equipment>,
}

impl<'a> ControlChartBuilder<'a> {
    pub fn new(equipment: &'a Equipment) -> Result<Self, ComparisonError> {
        Ok(Self {
            equipment,
            kinds: chartable_kinds(equipment.category())?,
            calendar: Utc.fix(),
            verification_type_id: None,
            references: HashMap::new(),
        })
    }

    pub fn calendar(mut self, calendar: FixedOffset) -> Self {
        self.calendar = calendar;
        self
    }

    /// Only chart records of this verification type
    pub fn verification_type(mut self, verification_type_id: impl Into<String>) -> Self {
        self.verification_type_id = Some(verification_type_id.into());
        self
    }

    /// Reference instruments by id, used to resolve balance EMPs
    pub fn references(mut self, references: impl IntoIterator<Item = &'a Equipment>) -> Self {
        self.references
            .extend(references.into_iter().map(|r| (r.id.clone(), r)));
        self
    }

    /// Chart over the instrument's own history
    pub fn build(&self) -> ControlChart {
        self.build_from(&self.equipment.verifications)
    }

    /// Chart over a pre-filtered set of records
    pub fn build_from(&self, records: &[Verification]) -> ControlChart {
        let mut points: Vec<ChartPoint> = records
            .iter()
            .filter(|v| match &self.verification_type_id {
                Some(id) => &v.verification_type_id == id,
                None => true,
            })
            .filter_map(|v| self.point(v))
            .collect();
        points.sort_by_key(|p| p.verified_at);

        let out_of_control_count = points.iter().filter(|p| p.out_of_control).count();
        info!(
            "Control chart for {}: {} point(s), {} out of control",
            self.equipment.id,
            points.len(),
            out_of_control_count
        );

        ControlChart {
            equipment_id: self.equipment.id.clone(),
            category: self.equipment.category(),
            out_of_control_count,
            points,
        }
    }

    fn point(&self, verification: &Verification) -> Option<ChartPoint> {
        let Some(verified_at) = verification.verified_at else {
            debug!("Skipping undated verification {:?}", verification.id);
            return None;
        };

        let decoded = notes::decode_verification(verification);
        let (kind, values, reference_id) = match &decoded {
            Some(note) => {
                let (kind, values) = values_of(&note.result)?;
                (kind, values, Some(note.reference_id.as_str()))
            }
            None => {
                let partial = legacy::decode_differences(verification.notes.as_deref()?)?;
                let values = match partial.diffs.as_slice() {
                    [d] => ChartValues::Single(*d),
                    [h, m, l] => ChartValues::Triple([*h, *m, *l]),
                    _ => return None,
                };
                (partial.kind, values, verification.reference_equipment_id.as_deref())
            }
        };

        if !self.kinds.contains(&kind) {
            debug!(
                "Skipping {:?} record {:?} on {} chart",
                kind,
                verification.id,
                self.equipment.category().label()
            );
            return None;
        }

        let emp = match kind {
            ComparisonKind::Balance => self.resolve_emp(verification, reference_id, decoded.as_ref()),
            _ => None,
        };

        Some(ChartPoint {
            verification_id: verification.id.clone(),
            verified_at,
            date_label: verified_at.with_timezone(&self.calendar).format("%d/%m/%Y").to_string(),
            kind,
            out_of_control: out_of_control(kind, &values, emp),
            values,
            emp,
        })
    }

    /// Stored EMP, then the OIML table, then whatever the record itself carries
    fn resolve_emp(
        &self,
        verification: &Verification,
        reference_id: Option<&str>,
        decoded: Option<&notes::ComparisonNote>,
    ) -> Option<f64> {
        let id = verification.reference_equipment_id.as_deref().or(reference_id);
        id.and_then(|id| self.references.get(id))
            .and_then(|r| r.reference_emp())
            .or_else(|| verification.notes.as_deref().and_then(legacy::find_emp))
            .or_else(|| match decoded.map(|n| &n.result) {
                Some(ComparisonResult::Balance(b)) => Some(b.emp_g),
                _ => None,
            })
    }
}

fn values_of(result: &ComparisonResult) -> Option<(ComparisonKind, ChartValues)> {
    let values = match result {
        ComparisonResult::Temperature(t) => ChartValues::Single(t.diff_f),
        ComparisonResult::MonthlyTemperature(m) => {
            ChartValues::Triple([m.high.diff_f, m.mid.diff_f, m.low.diff_f])
        }
        ComparisonResult::Tape(t) => ChartValues::Single(t.diff_mm),
        ComparisonResult::Balance(b) => ChartValues::Single(b.diff_g),
        ComparisonResult::Hydrometer(_) | ComparisonResult::KarlFischer(_) => return None,
    };
    Some((result.kind(), values))
}

/// Unresolved balance EMP never flags a point
fn out_of_control(kind: ComparisonKind, values: &ChartValues, emp: Option<f64>) -> bool {
    let limit = match kind {
        ComparisonKind::Temperature | ComparisonKind::MonthlyTemperature => limits::TEMPERATURE_F,
        ComparisonKind::Tape => limits::TAPE_MM,
        ComparisonKind::Balance => match emp {
            Some(emp) => emp,
            None => return false,
        },
        ComparisonKind::Hydrometer | ComparisonKind::KarlFischer => return false,
    };
    values.as_slice().iter().any(|d| !within(*d, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::{BalanceComparison, TemperatureComparison};
    use crate::model::{EquipmentType, Measure, Role};
    use crate::notes::ComparisonNote;
    use crate::units::{MassUnit, Measured, TemperatureUnit};
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap() + Duration::days(n)
    }

    fn thermometer() -> Equipment {
        Equipment::new(
            "th-1",
            EquipmentType::new("tt", "Termómetro digital", Role::Working, [Measure::Temperature], 1, 365),
        )
    }

    fn temperature_record(n: i64, diff: f64) -> Verification {
        let note = ComparisonNote {
            reference_id: "ref".into(),
            result: ComparisonResult::Temperature(TemperatureComparison {
                under: Measured::new(70.0 + diff, TemperatureUnit::Fahrenheit),
                reference: Measured::new(70.0, TemperatureUnit::Fahrenheit),
                diff_f: diff,
            }),
        };
        let mut v = Verification::new("daily", 1, day(n));
        v.id = Some(format!("v{}", n));
        v.notes = Some(legacy::encode(&note));
        v
    }

    #[test]
    fn test_sorted_and_flagged() {
        let mut eq = thermometer();
        eq.verifications = vec![temperature_record(3, 0.6), temperature_record(1, 0.1), temperature_record(2, -0.5)];
        let chart = ControlChartBuilder::new(&eq).unwrap().build();

        let ids: Vec<_> = chart.points.iter().map(|p| p.verification_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);
        assert_eq!(chart.out_of_control_count, 1);
        assert!(chart.points[2].out_of_control);
        assert!(!chart.points[1].out_of_control);
        assert_eq!(chart.points[0].date_label, "02/05/2024");
    }

    #[test]
    fn test_discards_undecodable_and_undated() {
        let mut eq = thermometer();
        let mut undated = temperature_record(1, 0.1);
        undated.verified_at = None;
        let mut free = Verification::new("daily", 1, day(2));
        free.notes = Some("todo bien".into());
        eq.verifications = vec![undated, free, temperature_record(3, 0.2)];

        let chart = ControlChartBuilder::new(&eq).unwrap().build();
        assert_eq!(chart.points.len(), 1);
    }

    #[test]
    fn test_type_filter_and_calendar_label() {
        let mut eq = thermometer();
        let mut monthly = temperature_record(5, 0.1);
        monthly.verification_type_id = "monthly".into();
        eq.verifications = vec![temperature_record(1, 0.1), monthly];

        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let chart = ControlChartBuilder::new(&eq)
            .unwrap()
            .verification_type("monthly")
            .calendar(minus_five)
            .build();
        assert_eq!(chart.points.len(), 1);
        assert_eq!(chart.points[0].date_label, "05/05/2024");
    }

    #[test]
    fn test_monthly_points_from_columns_and_legacy_text() {
        let mut eq = thermometer();

        let mut columns = Verification::new("monthly", 30, day(1));
        columns.id = Some("cols".into());
        columns.readings.reading_under_test_high = Some(100.2);
        columns.readings.reading_under_test_mid = Some(77.0);
        columns.readings.reading_under_test_low = Some(33.6);
        columns.readings.reference_reading_high = Some(100.0);
        columns.readings.reference_reading_mid = Some(77.0);
        columns.readings.reference_reading_low = Some(33.0);
        // Columns win over a conforming block in the notes
        columns.notes = Some(
            "Comparación mensual termómetro | Patron ID: 7 | Alto equipo: 100,1 F | Alto patron: 100,0 F | \
             Diferencia alto: 0,1 F | Medio equipo: 77 F | Medio patron: 77 F | Diferencia medio: 0 F | \
             Bajo equipo: 33,1 F | Bajo patron: 33 F | Diferencia bajo: 0,1 F | Resultado: Conforme"
                .into(),
        );

        let mut text = Verification::new("monthly", 30, day(2));
        text.id = Some("text".into());
        text.notes = Some(
            "Comparación mensual termómetro | Patron ID: 7 | Alto equipo: 100,3 F | Alto patron: 100,0 F | \
             Diferencia alto: 0,3 F | Medio equipo: 77,1 F | Medio patron: 77,0 F | Diferencia medio: 0,1 F | \
             Bajo equipo: 32,6 F | Bajo patron: 33,0 F | Diferencia bajo: -0,4 F | Resultado: Conforme"
                .into(),
        );

        eq.verifications = vec![text, columns];
        let chart = ControlChartBuilder::new(&eq).unwrap().build();

        assert_eq!(chart.points.len(), 2);
        assert_eq!(chart.out_of_control_count, 1);

        let first = &chart.points[0];
        assert_eq!(first.verification_id.as_deref(), Some("cols"));
        assert_eq!(first.kind, ComparisonKind::MonthlyTemperature);
        assert!(first.out_of_control);
        match first.values {
            ChartValues::Triple([h, m, l]) => {
                assert!((h - 0.2).abs() < 1e-9);
                assert!(m.abs() < 1e-9);
                assert!((l - 0.6).abs() < 1e-9);
            }
            ref other => panic!("unexpected {:?}", other),
        }

        let second = &chart.points[1];
        assert_eq!(second.verification_id.as_deref(), Some("text"));
        assert!(!second.out_of_control);
        match second.values {
            ChartValues::Triple([h, m, l]) => {
                assert!((h - 0.3).abs() < 1e-9);
                assert!((m - 0.1).abs() < 1e-9);
                assert!((l + 0.4).abs() < 1e-9);
            }
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_balance_emp_resolution() {
        let balance = EquipmentType::new("bt", "Balanza analítica", Role::Working, [Measure::Weight], 1, 365);
        let weight_type = EquipmentType::new("wt", "Pesa patrón", Role::Reference, [Measure::Weight], 0, 365);
        let mut weight = Equipment::new("w-100", weight_type);
        weight.nominal_mass_value = Some(100.0);
        weight.weight_class = Some("F1".into());

        let record = |n: i64, diff: f64, reference: &str| {
            let note = ComparisonNote {
                reference_id: reference.into(),
                result: ComparisonResult::Balance(BalanceComparison {
                    weight: Measured::new(100.0, MassUnit::G),
                    reading: Measured::new(100.0 - diff, MassUnit::G),
                    diff_g: diff,
                    emp_g: 0.01,
                }),
            };
            let mut v = Verification::new("daily", 1, day(n));
            v.notes = Some(legacy::encode(&note));
            v
        };

        let mut eq = Equipment::new("b-1", balance);
        eq.verifications = vec![record(1, -0.0003, "w-100"), record(2, -0.0008, "w-100"), record(3, -0.0008, "other")];
        let chart = ControlChartBuilder::new(&eq).unwrap().references([&weight]).build();

        assert!((chart.points[0].emp.unwrap() - 0.0005).abs() < 1e-12);
        assert!(!chart.points[0].out_of_control);
        assert!(chart.points[1].out_of_control);
        // unknown reference: EMP token from the note
        assert_eq!(chart.points[2].emp, Some(0.01));
        assert!(!chart.points[2].out_of_control);
        assert_eq!(chart.out_of_control_count, 1);
    }

    #[test]
    fn test_partial_legacy_block_is_charted() {
        let tape = EquipmentType::new("ct", "Cinta métrica", Role::Working, [Measure::Length], 1, 365);
        let mut eq = Equipment::new("c-1", tape);
        let mut v = Verification::new("daily", 1, day(1));
        v.notes = Some("Comparación cinta | Patron ID: 4 | Diferencia (Patron-Equipo): 2,5 mm".into());
        eq.verifications = vec![v];

        let chart = ControlChartBuilder::new(&eq).unwrap().build();
        assert_eq!(chart.points[0].values, ChartValues::Single(2.5));
        assert!(chart.needs_attention());
    }

    #[test]
    fn test_unsupported_category() {
        let gauge = EquipmentType::new("p", "Manómetro", Role::Working, [Measure::Pressure], 1, 365);
        assert!(matches!(
            ControlChartBuilder::new(&Equipment::new("m", gauge)),
            Err(ComparisonError::UnsupportedCategory(_))
        ));
    }
}
