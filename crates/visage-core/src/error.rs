//! Error types for the avatar engine

use thiserror::Error;

use crate::{AssetId, Generation};

/// Core VISAGE errors
///
/// None of these is fatal: the worst outcome is a resting avatar that the
/// next inbound response recovers.
#[derive(Error, Debug)]
pub enum VisageError {
    // Payload errors
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid audio encoding: {0}")]
    InvalidAudio(String),

    // Asset errors
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(AssetId),

    // Playback errors
    #[error("Playback failed for session {generation}: {reason}")]
    PlaybackFailure { generation: Generation, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for VisageError {
    fn from(err: serde_json::Error) -> Self {
        VisageError::MalformedPayload(err.to_string())
    }
}

/// Result type for VISAGE operations
pub type VisageResult<T> = Result<T, VisageError>;
