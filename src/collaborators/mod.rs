//! Collaborator Interfaces
//!
//! Data sources, persistence and the external API-60F correction service.
//! The engine only consumes their resolved results; transport, retries and
//! timeouts live behind these traits.

pub mod api60f;
pub mod snapshot;
pub mod store;

pub use api60f::HttpApi60fCorrector;
pub use snapshot::{load_snapshot, SnapshotFile};
pub use store::{InMemoryRecordStore, WriteOutcome, WritePolicy};

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::model::{Calibration, Equipment, Inspection, Verification, VerificationType};
use crate::notes::VerificationDraft;

/// Equipment records and their history
#[async_trait]
pub trait EquipmentSource: Send + Sync {
    /// Equipment with its type resolved; history lists may be empty
    async fn equipment(&self, equipment_id: &str) -> Result<Equipment, CollaboratorError>;
    async fn inspections(&self, equipment_id: &str) -> Result<Vec<Inspection>, CollaboratorError>;
    async fn verifications(&self, equipment_id: &str) -> Result<Vec<Verification>, CollaboratorError>;
    async fn calibrations(&self, equipment_id: &str) -> Result<Vec<Calibration>, CollaboratorError>;

    /// Equipment with all three history lists taken from one view.
    ///
    /// The default issues the four reads concurrently and is only consistent
    /// when no write can land between them. Sources that accept writes should
    /// answer from a single read.
    async fn snapshot(&self, equipment_id: &str) -> Result<Equipment, CollaboratorError> {
        let (equipment, inspections, verifications, calibrations) = tokio::try_join!(
            self.equipment(equipment_id),
            self.inspections(equipment_id),
            self.verifications(equipment_id),
            self.calibrations(equipment_id),
        )?;
        Ok(Equipment {
            inspections,
            verifications,
            calibrations,
            ..equipment
        })
    }
}

#[async_trait]
pub trait VerificationTypeSource: Send + Sync {
    async fn verification_types(&self, equipment_type_id: &str) -> Result<Vec<VerificationType>, CollaboratorError>;
}

/// External API gravity correction to 60 °F
#[async_trait]
pub trait Api60fCorrector: Send + Sync {
    async fn correct(&self, temp_f: f64, api: f64) -> Result<f64, CollaboratorError>;
}

/// Persistence for new history records
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save_inspection(
        &self,
        equipment_id: &str,
        inspection: Inspection,
        policy: WritePolicy,
    ) -> Result<WriteOutcome<Inspection>, CollaboratorError>;

    async fn save_verification(
        &self,
        equipment_id: &str,
        draft: VerificationDraft,
        policy: WritePolicy,
    ) -> Result<WriteOutcome<Verification>, CollaboratorError>;

    async fn save_calibration(
        &self,
        equipment_id: &str,
        calibration: Calibration,
    ) -> Result<Calibration, CollaboratorError>;
}
