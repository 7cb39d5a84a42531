//! Core types for selector resolution

use std::fmt;

use serde::{Deserialize, Serialize};

/// Locator strategy enumeration, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorStrategy {
    /// `#id` or `[id="…"]`
    Id,

    /// `[aria-label="…"]`
    AriaLabel,

    /// First class token
    Class,

    /// `xpath://*[contains(text(), …)]`
    Text,
}

impl LocatorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Id => "id",
            LocatorStrategy::AriaLabel => "aria-label",
            LocatorStrategy::Class => "class",
            LocatorStrategy::Text => "text",
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> [LocatorStrategy; 4] {
        [
            LocatorStrategy::Id,
            LocatorStrategy::AriaLabel,
            LocatorStrategy::Class,
            LocatorStrategy::Text,
        ]
    }
}

/// Concrete locator handed to the browser collaborator.
///
/// `selector` is the wire string (CSS, or `xpath:` prefixed XPath); `value`
/// is the raw identifying datum it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub selector: String,
    pub value: String,
}

impl Locator {
    pub const XPATH_PREFIX: &'static str = "xpath:";

    pub fn is_xpath(&self) -> bool {
        self.selector.starts_with(Self::XPATH_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)
    }
}
