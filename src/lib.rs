//! Laboratory Equipment Quality-State Engine
//!
//! Decides whether a measurement instrument may be used:
//! - Inspection, calibration and verification validity windows
//! - Working-vs-reference comparisons with a tri-state verdict
//! - Notes codec for comparison metadata (tagged payload + legacy text)
//! - Control charts over verification history

pub mod catalog;
pub mod chart;
pub mod collaborators;
pub mod comparison;
pub mod config;
pub mod error;
pub mod model;
pub mod notes;
pub mod units;
pub mod utils;
pub mod validity;

// Re-exports for convenience
pub use chart::{ControlChart, ControlChartBuilder};
pub use comparison::{ComparisonInput, ComparisonResult};
pub use error::{ComparisonError, EngineError};
pub use model::{Equipment, EquipmentCategory, Verdict};
pub use validity::{QualityEvaluator, QualityReport};
