use std::collections::{BTreeMap, HashMap};

use labelpilot_core_types::RiskTier;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PolicySnapshot {
    pub rev: u64,
    pub confidence: ConfidenceThresholds,
    pub risk: BTreeMap<String, IntentRule>,
    pub filter: FilterPolicy,
    pub tokens: TokenBudget,
    pub run: RunDefaults,
    pub provenance: HashMap<String, PolicyProvenance>,
}

/// Minimum confidence per risk tier.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl ConfidenceThresholds {
    pub fn for_tier(&self, tier: RiskTier) -> f64 {
        match tier {
            RiskTier::High => self.high,
            RiskTier::Medium => self.medium,
            RiskTier::Low => self.low,
        }
    }
}

/// Risk table entry for a single intent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntentRule {
    pub tier: RiskTier,
    pub min_confidence: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct FilterPolicy {
    pub max_depth: usize,
    pub max_children: usize,
    pub max_text_length: usize,
    pub min_text_length: usize,
    pub exclude_tags: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub important_tags: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct TokenBudget {
    pub max_tokens_per_call: usize,
    pub safety_margin: usize,
}

impl TokenBudget {
    /// Budget available to a single labeler batch.
    pub fn batch_budget(&self) -> usize {
        self.max_tokens_per_call.saturating_sub(self.safety_margin)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct RunDefaults {
    pub timeout_ms: u64,
    pub retry_if_missing: bool,
    pub screenshot_on_error: bool,
    pub log_actions: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyProvenance {
    pub path: String,
    pub source: PolicySource,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicySource {
    Builtin,
    File,
    Env,
    Cli,
}

impl PolicySnapshot {
    pub fn set_provenance(&mut self, path: &str, source: PolicySource) {
        self.provenance.insert(
            path.to_string(),
            PolicyProvenance {
                path: path.to_string(),
                source,
            },
        );
    }

    /// Raises every intent minimum to at least its tier threshold.
    pub fn normalize(&mut self) {
        let thresholds = self.confidence.clone();
        for rule in self.risk.values_mut() {
            let floor = thresholds.for_tier(rule.tier);
            if rule.min_confidence < floor {
                rule.min_confidence = floor;
            }
            rule.min_confidence = rule.min_confidence.min(1.0);
        }
    }
}
