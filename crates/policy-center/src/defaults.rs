use std::collections::BTreeMap;

use labelpilot_core_types::RiskTier;

use crate::model::{
    ConfidenceThresholds, FilterPolicy, IntentRule, PolicySnapshot, RunDefaults, TokenBudget,
};

pub const HIGH_RISK_INTENTS: &[&str] = &["submit-payment", "delete-account", "confirm-transaction"];

pub const MEDIUM_RISK_INTENTS: &[&str] = &[
    "login-button",
    "input-password",
    "input-confirm-password",
    "input-card-number",
    "input-expiry",
    "input-cvv",
    "checkout-button",
    "update-cart",
    "submit-form",
    "send-message",
];

pub const LOW_RISK_INTENTS: &[&str] = &[
    "input-username",
    "input-email",
    "input-text",
    "input-textarea",
    "input-quantity",
    "search-box",
    "nav-link",
    "close-modal",
];

pub fn default_snapshot() -> PolicySnapshot {
    let confidence = ConfidenceThresholds {
        high: 0.95,
        medium: 0.85,
        low: 0.70,
    };

    let mut risk = BTreeMap::new();
    for (tier, intents) in [
        (RiskTier::High, HIGH_RISK_INTENTS),
        (RiskTier::Medium, MEDIUM_RISK_INTENTS),
        (RiskTier::Low, LOW_RISK_INTENTS),
    ] {
        for intent in intents {
            risk.insert(
                intent.to_string(),
                IntentRule {
                    tier,
                    min_confidence: confidence.for_tier(tier),
                },
            );
        }
    }

    PolicySnapshot {
        rev: 1,
        confidence,
        risk,
        filter: FilterPolicy {
            max_depth: 12,
            max_children: 50,
            max_text_length: 200,
            min_text_length: 2,
            exclude_tags: to_strings(&[
                "script", "style", "noscript", "svg", "path", "iframe", "meta", "link", "head",
                "template",
            ]),
            exclude_patterns: to_strings(&[
                "advert",
                "ad-banner",
                "ad-slot",
                "sponsored",
                "cookie-banner",
                "tracking-pixel",
            ]),
            important_tags: to_strings(&[
                "li", "h1", "h2", "h3", "h4", "h5", "h6", "dl", "dt", "dd", "article",
            ]),
        },
        tokens: TokenBudget {
            max_tokens_per_call: 3_000,
            safety_margin: 500,
        },
        run: RunDefaults {
            timeout_ms: 5_000,
            retry_if_missing: true,
            screenshot_on_error: true,
            log_actions: true,
        },
        provenance: Default::default(),
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
