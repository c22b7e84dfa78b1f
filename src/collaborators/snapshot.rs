//! History snapshots
//!
//! Evaluators and the chart builder never read from a source directly; they
//! get one consistent copy of an instrument and its history.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EquipmentSource, InMemoryRecordStore};
use crate::error::CollaboratorError;
use crate::model::{Equipment, VerificationType};

/// Exported instrument history as read from disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    pub equipment: Equipment,
    #[serde(default)]
    pub verification_types: Vec<VerificationType>,
    /// Reference instruments the history points at
    #[serde(default)]
    pub references: Vec<Equipment>,
}

impl SnapshotFile {
    /// Load everything into `store`, returning the instrument's id
    pub async fn seed(self, store: &InMemoryRecordStore) -> String {
        let id = self.equipment.id.clone();
        store
            .set_verification_types(self.equipment.equipment_type.id.clone(), self.verification_types)
            .await;
        store.insert_equipment(self.equipment).await;
        for reference in self.references {
            store.insert_equipment(reference).await;
        }
        id
    }
}

/// Fetch equipment and its three history lists as one consistent copy
pub async fn load_snapshot<S>(source: &S, equipment_id: &str) -> Result<Equipment, CollaboratorError>
where
    S: EquipmentSource + ?Sized,
{
    let snapshot = source.snapshot(equipment_id).await?;

    debug!(
        "Snapshot of {}: {} inspection(s), {} verification(s), {} calibration(s)",
        equipment_id,
        snapshot.inspections.len(),
        snapshot.verifications.len(),
        snapshot.calibrations.len()
    );
    Ok(snapshot)
}
