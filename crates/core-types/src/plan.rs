//! Action plan vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Type,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a task plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub intent: String,
    pub action: ActionKind,
    pub required: bool,
}

impl PlanStep {
    pub fn new(intent: impl Into<String>, action: ActionKind, required: bool) -> Self {
        Self {
            intent: intent.into(),
            action,
            required,
        }
    }

    pub fn click(intent: impl Into<String>) -> Self {
        Self::new(intent, ActionKind::Click, true)
    }

    pub fn type_text(intent: impl Into<String>) -> Self {
        Self::new(intent, ActionKind::Type, true)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Human readable record, e.g. `type search-box`.
    pub fn describe(&self) -> String {
        format!("{} {}", self.action, self.intent)
    }
}
