//! Error types shared across the engine

use thiserror::Error;

/// Why a comparison could not produce a pass/fail verdict
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComparisonError {
    #[error("{side}: expected at least {required} numeric readings, got {found}")]
    InsufficientReadings {
        side: &'static str,
        required: usize,
        found: usize,
    },
    #[error("{side}: at most {max} readings are accepted, got {found}")]
    TooManyReadings {
        side: &'static str,
        max: usize,
        found: usize,
    },
    #[error("{side}: with only two readings both must be equal ({first} vs {second})")]
    UnequalPairedReadings {
        side: &'static str,
        first: f64,
        second: f64,
    },
    #[error("missing reading: {0}")]
    MissingReading(&'static str),
    #[error("unsupported unit `{0}`")]
    UnsupportedUnit(String),
    #[error("unsupported equipment category: {0}")]
    UnsupportedCategory(String),
    #[error("no EMP available for the reference weight")]
    MissingEmp,
    #[error("API-60F correction unavailable: {0}")]
    CorrectionUnavailable(String),
    #[error("titrant volume must be non-zero")]
    ZeroVolume,
}

/// Failures reported by collaborators (data sources, stores, external services)
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CollaboratorError::Decode(err.to_string())
        } else {
            CollaboratorError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Umbrella error for callers that mix engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Comparison(#[from] ComparisonError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
