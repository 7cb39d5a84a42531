//! Error types for semantic labeling
use labelpilot_core_types::PilotError;
use thiserror::Error;

/// Errors raised by a labeler. The pipeline absorbs them per batch.
#[derive(Debug, Error)]
pub enum LabelingError {
    #[error("labeler transport failed: {0}")]
    Transport(String),

    #[error("labeler returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed labeler response: {0}")]
    MalformedResponse(String),

    #[error("labeler misconfigured: {0}")]
    InvalidConfig(String),

    #[error("invalid labeling rule: {0}")]
    Rule(#[from] regex::Error),
}

impl From<LabelingError> for PilotError {
    fn from(value: LabelingError) -> Self {
        PilotError::new(value.to_string())
    }
}

/// Result type for labeling operations
pub type Result<T> = std::result::Result<T, LabelingError>;
