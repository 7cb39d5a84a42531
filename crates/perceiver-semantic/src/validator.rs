//! Confidence/risk gate between labeler output and the action planner.

use std::sync::Arc;

use labelpilot_core_types::{FilteredElement, LabeledElement, RiskTier, OTHER_INTENT};
use labelpilot_policy_center::RiskPolicy;

use crate::models::RawLabel;

/// Result of validating one element.
#[derive(Clone, Debug, PartialEq)]
pub struct Validation {
    pub element: LabeledElement,
    /// The labeler's intent was replaced with `other`.
    pub downgraded: bool,
    /// The labeler reported a high-risk intent below the high-risk threshold.
    pub high_risk_skipped: bool,
}

#[derive(Clone, Debug)]
pub struct LabelValidator {
    policy: Arc<RiskPolicy>,
}

impl LabelValidator {
    pub fn new(policy: Arc<RiskPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Invariant: a non-`other` intent survives only with confidence at or
    /// above that intent's table minimum.
    pub fn validate(&self, element: FilteredElement, label: Option<&RawLabel>) -> Validation {
        let confidence = label.and_then(|l| sanitize_confidence(l.confidence));
        let important = label.and_then(|l| l.important).unwrap_or(false);
        let intent = label
            .and_then(|l| l.intent.as_deref())
            .map(|i| i.trim().to_ascii_lowercase())
            .filter(|i| !i.is_empty() && i != OTHER_INTENT);

        let rule = intent
            .as_deref()
            .and_then(|i| self.policy.rule(i).map(|rule| (i, rule)));

        let high_risk_skipped = matches!(rule, Some((_, r)) if r.tier == RiskTier::High)
            && confidence.unwrap_or(0.0) < self.policy.high_threshold();

        match (rule, confidence) {
            (Some((intent, rule)), Some(conf)) if conf >= rule.min_confidence => Validation {
                element: LabeledElement {
                    element,
                    intent: intent.to_string(),
                    confidence: conf.min(1.0),
                    risk: rule.tier,
                    important,
                },
                downgraded: false,
                high_risk_skipped,
            },
            _ => Validation {
                element: LabeledElement {
                    element,
                    intent: OTHER_INTENT.to_string(),
                    confidence: confidence
                        .unwrap_or(0.0)
                        .min(self.policy.low_threshold()),
                    risk: RiskTier::Low,
                    important,
                },
                downgraded: intent.is_some(),
                high_risk_skipped,
            },
        }
    }
}

/// Non-finite counts as absent; negatives clamp to zero.
fn sanitize_confidence(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.max(0.0))
}
