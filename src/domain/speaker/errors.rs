//! Speaker Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeakerError {
    #[error("invalid speaker name: {0}")]
    InvalidName(String),

    #[error("invalid audio sample: {0}")]
    InvalidAudio(String),

    #[error("invalid property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },
}
