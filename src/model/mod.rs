//! Model Module
//! 
//! Equipment, its type, and the inspection/verification/calibration history
//! read from collaborators.

pub mod category;
pub mod equipment;
pub mod records;
pub mod verdict;

pub use category::{Cadence, ComparisonKind, EquipmentCategory};
pub use equipment::{Equipment, EquipmentStatus, EquipmentType, Measure, Role};
pub use records::{
    Calibration, CalibrationResult, Inspection, StructuredReadings, Verification, VerificationType,
};
pub use verdict::Verdict;
