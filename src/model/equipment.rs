//! Equipment and equipment types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::category::EquipmentCategory;
use super::records::{Calibration, Inspection, Verification};
use crate::units::{get_weight_emp, MassUnit, WeightClass};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Stored,
    InUse,
    Maintenance,
    NeedsReview,
    Lost,
    Disposed,
    #[serde(other)]
    Unknown,
}

impl EquipmentStatus {
    /// Whether the instrument can be put to operational use at all
    pub fn allows_use(self) -> bool {
        !matches!(
            self,
            EquipmentStatus::Lost | EquipmentStatus::Disposed | EquipmentStatus::Maintenance
        )
    }

    /// Whether new inspections or verifications may be recorded against it
    pub fn allows_recording(self) -> bool {
        !matches!(self, EquipmentStatus::Lost | EquipmentStatus::Disposed)
    }
}

impl Default for EquipmentStatus {
    fn default() -> Self {
        EquipmentStatus::Unknown
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reference,
    Working,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Temperature,
    Length,
    Weight,
    Pressure,
    Api,
    PercentPv,
    RelativeHumidity,
}

/// Shape of an equipment type as collaborators deliver it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EquipmentTypeRecord {
    #[serde(default)]
    id: String,
    name: String,
    role: Role,
    #[serde(default)]
    measures: BTreeSet<Measure>,
    #[serde(default)]
    inspection_days: i64,
    #[serde(default)]
    calibration_days: i64,
}

/// An equipment type with its category resolved at load time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "EquipmentTypeRecord")]
pub struct EquipmentType {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub measures: BTreeSet<Measure>,
    pub inspection_days: i64,
    pub calibration_days: i64,
    pub category: EquipmentCategory,
}

impl EquipmentType {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        measures: impl IntoIterator<Item = Measure>,
        inspection_days: i64,
        calibration_days: i64,
    ) -> Self {
        let name = name.into();
        let measures: BTreeSet<Measure> = measures.into_iter().collect();
        let category = EquipmentCategory::resolve(&name, role, &measures);
        Self {
            id: id.into(),
            name,
            role,
            measures,
            inspection_days,
            calibration_days,
            category,
        }
    }
}

impl From<EquipmentTypeRecord> for EquipmentType {
    fn from(raw: EquipmentTypeRecord) -> Self {
        EquipmentType::new(
            raw.id,
            raw.name,
            raw.role,
            raw.measures,
            raw.inspection_days,
            raw.calibration_days,
        )
    }
}

/// A measurement instrument together with a snapshot of its history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub equipment_type_id: String,
    #[serde(default)]
    pub terminal_id: Option<String>,
    #[serde(default)]
    pub status: EquipmentStatus,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub equipment_type: EquipmentType,
    #[serde(default)]
    pub nominal_mass_value: Option<f64>,
    #[serde(default)]
    pub nominal_mass_unit: Option<String>,
    #[serde(default)]
    pub weight_class: Option<String>,
    /// EMP in grams, when the certificate states one explicitly
    #[serde(default)]
    pub emp_value: Option<f64>,
    #[serde(default)]
    pub inspection_days_override: Option<i64>,
    #[serde(default)]
    pub inspections: Vec<Inspection>,
    #[serde(default)]
    pub verifications: Vec<Verification>,
    #[serde(default)]
    pub calibrations: Vec<Calibration>,
}

fn default_active() -> bool {
    true
}

impl Equipment {
    pub fn new(id: impl Into<String>, equipment_type: EquipmentType) -> Self {
        Self {
            id: id.into(),
            serial: String::new(),
            equipment_type_id: equipment_type.id.clone(),
            terminal_id: None,
            status: EquipmentStatus::InUse,
            is_active: true,
            equipment_type,
            nominal_mass_value: None,
            nominal_mass_unit: None,
            weight_class: None,
            emp_value: None,
            inspection_days_override: None,
            inspections: Vec::new(),
            verifications: Vec::new(),
            calibrations: Vec::new(),
        }
    }

    pub fn is_reference(&self) -> bool {
        self.equipment_type.role == Role::Reference
    }

    pub fn category(&self) -> EquipmentCategory {
        self.equipment_type.category
    }

    /// Nominal mass in grams; grams are assumed when no unit is stored
    pub fn nominal_mass_grams(&self) -> Option<f64> {
        let value = self.nominal_mass_value.filter(|v| v.is_finite())?;
        match self.nominal_mass_unit.as_deref() {
            None | Some("") => Some(value),
            Some(unit) => MassUnit::parse(unit).map(|u| u.to_grams(value)),
        }
    }

    /// EMP in grams from the stored value, else from the OIML table
    pub fn reference_emp(&self) -> Option<f64> {
        if let Some(emp) = self.emp_value.filter(|v| v.is_finite() && *v > 0.0) {
            return Some(emp);
        }
        let class = self.weight_class.as_deref().and_then(WeightClass::parse)?;
        get_weight_emp(self.nominal_mass_grams()?, class)
    }
}
