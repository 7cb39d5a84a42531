//! Usable-label filtering and per-step best match.

use std::cmp::Ordering;

use labelpilot_core_types::LabeledElement;
use labelpilot_policy_center::RiskPolicy;

/// Visible, enabled, and confident enough for its own risk tier.
pub fn is_usable(label: &LabeledElement, policy: &RiskPolicy) -> bool {
    label.visible() && !label.disabled() && label.confidence >= policy.threshold(label.risk)
}

pub fn usable_labels<'a, I>(labels: I, policy: &RiskPolicy) -> Vec<LabeledElement>
where
    I: IntoIterator<Item = &'a LabeledElement>,
{
    labels
        .into_iter()
        .filter(|label| is_usable(label, policy))
        .cloned()
        .collect()
}

/// Best candidate for `intent`: important first, then higher confidence,
/// then earlier document position.
pub fn best_match<'a>(labels: &'a [LabeledElement], intent: &str) -> Option<&'a LabeledElement> {
    labels
        .iter()
        .filter(|label| label.intent == intent)
        .min_by(|a, b| rank(a, b))
}

fn rank(a: &LabeledElement, b: &LabeledElement) -> Ordering {
    b.important
        .cmp(&a.important)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.node_index().cmp(&b.node_index()))
}
