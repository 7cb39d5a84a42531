//! Validated label model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::FilteredElement;
use crate::PilotError;

/// Catch-all intent assigned to anything that is not trusted with a specific role.
pub const OTHER_INTENT: &str = "other";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    /// Overlay colour used when labels are drawn onto the page.
    pub fn overlay_color(&self) -> &'static str {
        match self {
            RiskTier::High => "#ff4444",
            RiskTier::Medium => "#ffaa00",
            RiskTier::Low => "#44ff44",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = PilotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskTier::Low),
            "medium" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            other => Err(PilotError::new(format!("unknown risk tier: {other}"))),
        }
    }
}

/// A filtered element carrying a validated intent, confidence and risk tier.
///
/// Instances are normally produced by the label validator. Hand-built
/// instances are accepted by the matcher, which re-checks confidence
/// against the risk tier before using them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledElement {
    #[serde(flatten)]
    pub element: FilteredElement,
    pub intent: String,
    pub confidence: f64,
    pub risk: RiskTier,
    pub important: bool,
}

impl LabeledElement {
    pub fn is_other(&self) -> bool {
        self.intent == OTHER_INTENT
    }

    pub fn visible(&self) -> bool {
        self.element.visible
    }

    pub fn disabled(&self) -> bool {
        self.element.disabled
    }

    pub fn node_index(&self) -> usize {
        self.element.node_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_tier_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<RiskTier>().unwrap(), RiskTier::High);
        assert_eq!(" low ".parse::<RiskTier>().unwrap(), RiskTier::Low);
        assert!("critical".parse::<RiskTier>().is_err());
    }

    #[test]
    fn labeled_element_flattens_element_fields() {
        let labeled = LabeledElement {
            element: FilteredElement {
                tag: "input".into(),
                visible: true,
                ..Default::default()
            },
            intent: "search-box".into(),
            confidence: 0.9,
            risk: RiskTier::Low,
            important: true,
        };
        let value = serde_json::to_value(&labeled).unwrap();
        assert_eq!(value["tag"], "input");
        assert_eq!(value["visible"], true);
        assert_eq!(value["risk"], "low");

        let back: LabeledElement = serde_json::from_value(value).unwrap();
        assert_eq!(back, labeled);
    }
}
