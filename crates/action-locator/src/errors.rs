//! Error types for selector resolution

use labelpilot_core_types::PilotError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Element carries no id, aria-label, class or text to locate it by
    #[error("no identifying data for element #{node_index} <{tag}>")]
    Unresolvable { node_index: usize, tag: String },
}

impl From<LocatorError> for PilotError {
    fn from(value: LocatorError) -> Self {
        PilotError::new(value.to_string())
    }
}
