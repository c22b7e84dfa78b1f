//! Versioned tagged encoding
//!
//! JSON envelope stored in a verification's `comparison` field next to the
//! human-readable notes. The comparison kind is the discriminator of the
//! typed payload.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ComparisonNote;
use crate::comparison::ComparisonResult;
use crate::error::EngineError;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    v: u32,
    reference_id: String,
    comparison: ComparisonResult,
}

/// Serialize a note as a version-1 envelope
pub fn encode(note: &ComparisonNote) -> Result<String, EngineError> {
    let envelope = Envelope {
        v: CURRENT_VERSION,
        reference_id: note.reference_id.clone(),
        comparison: note.result.clone(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse an envelope; unknown versions and malformed JSON yield `None`
pub fn decode(raw: &str) -> Option<ComparisonNote> {
    let envelope: Envelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Ignoring malformed comparison payload: {}", e);
            return None;
        }
    };
    if envelope.v != CURRENT_VERSION {
        debug!("Ignoring comparison payload with unknown version {}", envelope.v);
        return None;
    }
    Some(ComparisonNote {
        reference_id: envelope.reference_id,
        result: envelope.comparison,
    })
}
