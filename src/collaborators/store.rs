//! In-memory record store
//!
//! Holds equipment snapshots and the verification-type catalog, and enforces
//! the one-record-per-day rule: a second inspection, or a second verification
//! of the same type, on the same laboratory day is reported as a conflict
//! unless the caller explicitly asks to replace it.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::{EquipmentSource, RecordStore, VerificationTypeSource};
use crate::error::CollaboratorError;
use crate::model::{Calibration, Equipment, Inspection, Verification, VerificationType};
use crate::notes::VerificationDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    #[default]
    RejectIfExists,
    Replace,
}

/// Result of a write that may collide with a record from the same day
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    Stored(T),
    /// Nothing was written; `existing` is the record already on file for today
    ConflictToday { existing: T },
}

impl<T> WriteOutcome<T> {
    pub fn is_conflict(&self) -> bool {
        matches!(self, WriteOutcome::ConflictToday { .. })
    }

    pub fn stored(self) -> Option<T> {
        match self {
            WriteOutcome::Stored(record) => Some(record),
            WriteOutcome::ConflictToday { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct InMemoryRecordStore {
    equipment: Arc<RwLock<HashMap<String, Equipment>>>,
    types: Arc<RwLock<HashMap<String, Vec<VerificationType>>>>,
    calendar: FixedOffset,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl InMemoryRecordStore {
    pub fn new(calendar: FixedOffset) -> Self {
        Self {
            equipment: Arc::new(RwLock::new(HashMap::new())),
            types: Arc::new(RwLock::new(HashMap::new())),
            calendar,
        }
    }

    pub async fn insert_equipment(&self, equipment: Equipment) {
        let mut map = self.equipment.write().await;
        map.insert(equipment.id.clone(), equipment);
    }

    pub async fn set_verification_types(&self, equipment_type_id: impl Into<String>, types: Vec<VerificationType>) {
        let mut map = self.types.write().await;
        map.insert(equipment_type_id.into(), types);
    }

    fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.calendar).date_naive()
    }

    fn not_found(equipment_id: &str) -> CollaboratorError {
        CollaboratorError::NotFound {
            kind: "equipment",
            id: equipment_id.to_string(),
        }
    }

    async fn with_equipment<T>(
        &self,
        equipment_id: &str,
        read: impl FnOnce(&Equipment) -> T + Send,
    ) -> Result<T, CollaboratorError> {
        let map = self.equipment.read().await;
        map.get(equipment_id).map(read).ok_or_else(|| Self::not_found(equipment_id))
    }
}

#[async_trait]
impl EquipmentSource for InMemoryRecordStore {
    async fn equipment(&self, equipment_id: &str) -> Result<Equipment, CollaboratorError> {
        self.with_equipment(equipment_id, Equipment::clone).await
    }

    async fn inspections(&self, equipment_id: &str) -> Result<Vec<Inspection>, CollaboratorError> {
        self.with_equipment(equipment_id, |e| e.inspections.clone()).await
    }

    async fn verifications(&self, equipment_id: &str) -> Result<Vec<Verification>, CollaboratorError> {
        self.with_equipment(equipment_id, |e| e.verifications.clone()).await
    }

    async fn calibrations(&self, equipment_id: &str) -> Result<Vec<Calibration>, CollaboratorError> {
        self.with_equipment(equipment_id, |e| e.calibrations.clone()).await
    }

    /// One read lock covers the record and its history
    async fn snapshot(&self, equipment_id: &str) -> Result<Equipment, CollaboratorError> {
        self.with_equipment(equipment_id, Equipment::clone).await
    }
}

#[async_trait]
impl VerificationTypeSource for InMemoryRecordStore {
    async fn verification_types(&self, equipment_type_id: &str) -> Result<Vec<VerificationType>, CollaboratorError> {
        let map = self.types.read().await;
        map.get(equipment_type_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound {
                kind: "equipment type",
                id: equipment_type_id.to_string(),
            })
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn save_inspection(
        &self,
        equipment_id: &str,
        mut inspection: Inspection,
        policy: WritePolicy,
    ) -> Result<WriteOutcome<Inspection>, CollaboratorError> {
        let mut map = self.equipment.write().await;
        let equipment = map.get_mut(equipment_id).ok_or_else(|| Self::not_found(equipment_id))?;

        let day = self.day_of(inspection.inspected_at);
        let existing = equipment
            .inspections
            .iter()
            .position(|i| self.day_of(i.inspected_at) == day);

        if let Some(pos) = existing {
            if policy == WritePolicy::RejectIfExists {
                warn!("Inspection for {} already recorded on {}", equipment_id, day);
                return Ok(WriteOutcome::ConflictToday {
                    existing: equipment.inspections[pos].clone(),
                });
            }
            equipment.inspections.remove(pos);
        }

        inspection.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        equipment.inspections.push(inspection.clone());
        info!("Inspection stored for {}", equipment_id);
        Ok(WriteOutcome::Stored(inspection))
    }

    async fn save_verification(
        &self,
        equipment_id: &str,
        draft: VerificationDraft,
        policy: WritePolicy,
    ) -> Result<WriteOutcome<Verification>, CollaboratorError> {
        let mut map = self.equipment.write().await;
        let equipment = map.get_mut(equipment_id).ok_or_else(|| Self::not_found(equipment_id))?;

        let day = self.day_of(draft.verified_at);
        let existing = equipment.verifications.iter().position(|v| {
            v.verification_type_id == draft.verification_type_id
                && v.verified_at.map(|at| self.day_of(at)) == Some(day)
        });

        let id = match existing {
            Some(pos) if policy == WritePolicy::RejectIfExists => {
                warn!(
                    "Verification {} for {} already recorded on {}",
                    draft.verification_type_id, equipment_id, day
                );
                return Ok(WriteOutcome::ConflictToday {
                    existing: equipment.verifications[pos].clone(),
                });
            }
            Some(pos) => {
                let replaced = equipment.verifications.remove(pos);
                replaced.id.unwrap_or_else(|| Uuid::new_v4().to_string())
            }
            None => Uuid::new_v4().to_string(),
        };

        let verification = draft.into_verification(id);
        equipment.verifications.push(verification.clone());
        info!(
            "Verification {} stored for {} (ok: {:?})",
            verification.verification_type_id, equipment_id, verification.is_ok
        );
        Ok(WriteOutcome::Stored(verification))
    }

    async fn save_calibration(
        &self,
        equipment_id: &str,
        mut calibration: Calibration,
    ) -> Result<Calibration, CollaboratorError> {
        let mut map = self.equipment.write().await;
        let equipment = map.get_mut(equipment_id).ok_or_else(|| Self::not_found(equipment_id))?;

        calibration.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        equipment.calibrations.push(calibration.clone());
        info!("Calibration stored for {}", equipment_id);
        Ok(calibration)
    }
}
