//! Validity Module
//!
//! Decides whether an instrument's inspection, calibration and verifications
//! are currently in force. The three axes are independent predicates over a
//! history snapshot; nothing here mutates or persists.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{Cadence, Equipment, EquipmentCategory, EquipmentStatus, Verification, VerificationType};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// State of one validity axis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AxisStatus {
    /// The policy does not require this axis
    NotRequired,
    Valid { last: DateTime<Utc>, age_days: f64 },
    Expired { last: DateTime<Utc>, age_days: f64 },
    /// No qualifying record exists
    Missing,
}

impl AxisStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, AxisStatus::NotRequired | AxisStatus::Valid { .. })
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        match self {
            AxisStatus::Valid { last, .. } | AxisStatus::Expired { last, .. } => Some(*last),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationTypeStatus {
    pub verification_type: VerificationType,
    pub status: AxisStatus,
}

/// Validity of every axis for one instrument at one instant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityReport {
    pub equipment_id: String,
    pub category: EquipmentCategory,
    pub evaluated_at: DateTime<Utc>,
    pub inspection: AxisStatus,
    pub calibration: AxisStatus,
    pub verifications: Vec<VerificationTypeStatus>,
    /// Fit for operational use right now
    pub operational: bool,
}

/// Why new inspections or verifications cannot be recorded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordBlock {
    #[error("equipment is inactive")]
    Inactive,
    #[error("equipment status {0:?} does not allow new records")]
    Status(EquipmentStatus),
    #[error("no calibration on record")]
    CalibrationMissing,
    #[error("calibration expired ({age_days:.1} days old)")]
    CalibrationExpired { age_days: f64 },
}

/// Evaluates validity against the laboratory calendar.
///
/// `calendar` fixes where midnight falls for whole-day verification ages.
#[derive(Debug, Clone, Copy)]
pub struct QualityEvaluator {
    calendar: FixedOffset,
}

impl QualityEvaluator {
    pub fn new(calendar: FixedOffset) -> Self {
        Self { calendar }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn calendar(&self) -> FixedOffset {
        self.calendar
    }

    /// Inspection axis: last approved inspection within the inspection period
    pub fn inspection_status(&self, equipment: &Equipment, now: DateTime<Utc>) -> AxisStatus {
        if equipment.is_reference() {
            return AxisStatus::NotRequired;
        }
        let days = equipment
            .inspection_days_override
            .unwrap_or(equipment.equipment_type.inspection_days);
        if days <= 0 {
            return AxisStatus::NotRequired;
        }

        let last = equipment
            .inspections
            .iter()
            .filter(|i| i.is_ok == Some(true))
            .map(|i| i.inspected_at)
            .max();

        match last {
            None => AxisStatus::Missing,
            Some(last) => {
                let age_days = fractional_days(now, last);
                if age_days <= days as f64 {
                    AxisStatus::Valid { last, age_days }
                } else {
                    AxisStatus::Expired { last, age_days }
                }
            }
        }
    }

    /// Calibration axis: any calibration counts, approval is not required
    pub fn calibration_status(&self, equipment: &Equipment, now: DateTime<Utc>) -> AxisStatus {
        let Some(last) = equipment.calibrations.iter().map(|c| c.calibrated_at).max() else {
            return AxisStatus::Missing;
        };
        let age_days = fractional_days(now, last);
        let days = equipment.equipment_type.calibration_days;
        if days <= 0 || age_days <= days as f64 {
            AxisStatus::Valid { last, age_days }
        } else {
            AxisStatus::Expired { last, age_days }
        }
    }

    /// Whole calendar days between the verification date and `now`
    pub fn whole_day_age(&self, verified_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let today = now.with_timezone(&self.calendar).date_naive();
        let day = verified_at.with_timezone(&self.calendar).date_naive();
        (today - day).num_days()
    }

    /// Whether one verification keeps its type in force.
    ///
    /// Daily checks only count on the day they were made; other cadences
    /// count while the age is strictly below the period.
    pub fn verification_counts(&self, verification: &Verification, cadence: Cadence, now: DateTime<Utc>) -> bool {
        if verification.is_ok != Some(true) {
            return false;
        }
        let Some(verified_at) = verification.verified_at else {
            return false;
        };
        let age = self.whole_day_age(verified_at, now);
        if age < 0 {
            return false;
        }
        match cadence {
            Cadence::Daily => age == 0,
            other => age < other.days(),
        }
    }

    /// Verification axis for one verification type
    pub fn verification_status(
        &self,
        equipment: &Equipment,
        verification_type: &VerificationType,
        now: DateTime<Utc>,
    ) -> AxisStatus {
        if equipment.is_reference() {
            return AxisStatus::NotRequired;
        }

        let approved: Vec<&Verification> = equipment
            .verifications
            .iter()
            .filter(|v| v.verification_type_id == verification_type.id)
            .filter(|v| v.is_ok == Some(true) && v.verified_at.is_some())
            .collect();

        let counting = approved
            .iter()
            .filter(|v| {
                let cadence = if v.frequency_days > 0 {
                    v.cadence()
                } else {
                    verification_type.cadence()
                };
                self.verification_counts(v, cadence, now)
            })
            .filter_map(|v| v.verified_at)
            .max();

        if let Some(last) = counting {
            return AxisStatus::Valid {
                last,
                age_days: self.whole_day_age(last, now) as f64,
            };
        }

        match approved.iter().filter_map(|v| v.verified_at).max() {
            Some(last) => AxisStatus::Expired {
                last,
                age_days: self.whole_day_age(last, now) as f64,
            },
            None => AxisStatus::Missing,
        }
    }

    /// Evaluate every axis and the operational gate
    pub fn report(&self, equipment: &Equipment, catalog: &[VerificationType], now: DateTime<Utc>) -> QualityReport {
        let inspection = self.inspection_status(equipment, now);
        let calibration = self.calibration_status(equipment, now);
        let verifications: Vec<VerificationTypeStatus> = catalog
            .iter()
            .map(|vt| VerificationTypeStatus {
                verification_type: vt.clone(),
                status: self.verification_status(equipment, vt, now),
            })
            .collect();

        let operational = equipment.is_active
            && equipment.status.allows_use()
            && inspection.is_valid()
            && calibration.is_valid();

        debug!(
            equipment = %equipment.id,
            inspection = inspection.is_valid(),
            calibration = calibration.is_valid(),
            operational,
            "Evaluated equipment validity"
        );

        QualityReport {
            equipment_id: equipment.id.clone(),
            category: equipment.category(),
            evaluated_at: now,
            inspection,
            calibration,
            verifications,
            operational,
        }
    }

    /// Gate applied before a new inspection or verification is recorded
    pub fn check_can_record(&self, equipment: &Equipment, now: DateTime<Utc>) -> Result<(), RecordBlock> {
        if !equipment.is_active {
            return Err(RecordBlock::Inactive);
        }
        if !equipment.status.allows_recording() {
            return Err(RecordBlock::Status(equipment.status));
        }
        match self.calibration_status(equipment, now) {
            AxisStatus::Missing => Err(RecordBlock::CalibrationMissing),
            AxisStatus::Expired { age_days, .. } => Err(RecordBlock::CalibrationExpired { age_days }),
            _ => Ok(()),
        }
    }
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self::utc()
    }
}

fn fractional_days(now: DateTime<Utc>, then: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / MILLIS_PER_DAY
}
