use labelpilot_core_types::FilteredElement;
use serde::{Deserialize, Serialize};

/// Independently labeled group of shallow elements sharing one context label.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub context: String,
    pub elements: Vec<FilteredElement>,
    pub token_estimate: usize,
}

impl Chunk {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

/// Slice of one chunk sized for a single labeler call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub context: String,
    pub elements: Vec<FilteredElement>,
    pub token_estimate: usize,
    /// Set when a single element exceeded the budget and was cut down.
    pub oversized: bool,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}
