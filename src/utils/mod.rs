//! Utils Module
pub mod telemetry;
pub mod text;

pub use telemetry::init_logging;
pub use text::fold_accents;
