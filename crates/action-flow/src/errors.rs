//! Flow execution error types

use labelpilot_core_types::PilotError;
use thiserror::Error;

/// Errors returned before a run starts. Everything after that ends in a
/// structured `RunResult` instead.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Request rejected before any collaborator was invoked
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Runner could not be assembled
    #[error("runner setup failed: {0}")]
    Setup(String),
}

impl FlowError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<perceiver_semantic::LabelingError> for FlowError {
    fn from(err: perceiver_semantic::LabelingError) -> Self {
        FlowError::Setup(err.to_string())
    }
}

impl From<FlowError> for PilotError {
    fn from(value: FlowError) -> Self {
        PilotError::new(value.to_string())
    }
}

/// Failures reported by the browser collaborator.
#[derive(Debug, Error, Clone)]
pub enum BrowserError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no element matches {0}")]
    NotFound(String),

    #[error("action on {selector} failed: {reason}")]
    Action { selector: String, reason: String },

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("browser unavailable: {0}")]
    Unavailable(String),
}

impl From<BrowserError> for PilotError {
    fn from(value: BrowserError) -> Self {
        PilotError::new(value.to_string())
    }
}
