use std::collections::BTreeMap;

use labelpilot_core_types::RiskTier;
use once_cell::sync::Lazy;

use crate::defaults::default_snapshot;
use crate::model::{ConfidenceThresholds, IntentRule, PolicySnapshot};

static BUILTIN: Lazy<RiskPolicy> = Lazy::new(|| RiskPolicy::from_snapshot(&default_snapshot()));

/// Intent risk table plus tier thresholds.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskPolicy {
    thresholds: ConfidenceThresholds,
    rules: BTreeMap<String, IntentRule>,
}

impl RiskPolicy {
    pub fn from_snapshot(snapshot: &PolicySnapshot) -> Self {
        Self {
            thresholds: snapshot.confidence.clone(),
            rules: snapshot.risk.clone(),
        }
    }

    pub fn builtin() -> &'static RiskPolicy {
        &BUILTIN
    }

    /// Rule for a known intent. `other` and unknown intents have none.
    pub fn rule(&self, intent: &str) -> Option<&IntentRule> {
        self.rules.get(intent)
    }

    pub fn threshold(&self, tier: RiskTier) -> f64 {
        self.thresholds.for_tier(tier)
    }

    pub fn low_threshold(&self) -> f64 {
        self.thresholds.low
    }

    pub fn high_threshold(&self) -> f64 {
        self.thresholds.high
    }

    pub fn is_high_risk(&self, intent: &str) -> bool {
        self.rule(intent)
            .map(|rule| rule.tier == RiskTier::High)
            .unwrap_or(false)
    }

    pub fn intents(&self) -> impl Iterator<Item = (&str, &IntentRule)> {
        self.rules.iter().map(|(intent, rule)| (intent.as_str(), rule))
    }
}
