//! Rule-based local labeler.
//!
//! Used when no remote labeling service is requested. Rule confidences stay
//! below the default high-risk threshold.

use async_trait::async_trait;
use labelpilot_core_types::FilteredElement;
use perceiver_structural::Batch;
use regex::Regex;
use tracing::trace;

use crate::errors::Result;
use crate::models::RawLabel;
use crate::ports::LabelerPort;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Field,
    Control,
}

#[derive(Clone, Debug)]
struct Rule {
    intent: &'static str,
    target: Target,
    pattern: Regex,
    confidence: f64,
    important: bool,
}

// Ordered most specific first; first match wins.
const RULES: &[(&str, Target, &str, f64, bool)] = &[
    (
        "input-confirm-password",
        Target::Field,
        r"type=password\b.*\b(confirm|repeat|again|retype|verify)",
        0.90,
        true,
    ),
    ("input-password", Target::Field, r"type=password\b", 0.92, true),
    ("input-card-number", Target::Field, r"card.?(number|no)|cc-?number|\bpan\b", 0.88, true),
    ("input-expiry", Target::Field, r"expir|exp-?date|mm\s*/\s*yy|cc-exp", 0.88, true),
    ("input-cvv", Target::Field, r"\bcvv\b|\bcvc\b|security code|cc-csc", 0.88, true),
    ("input-email", Target::Field, r"type=email\b|e-?mail", 0.90, true),
    ("input-username", Target::Field, r"user(name)?\b|login|account name|\buser", 0.88, true),
    ("search-box", Target::Field, r"type=search\b|search|\bquery\b|\bq\b", 0.90, true),
    ("input-quantity", Target::Field, r"\bqty\b|quantity", 0.86, true),
    ("input-textarea", Target::Field, r"^textarea\b", 0.86, true),
    ("input-text", Target::Field, r"type=text\b|^input\b", 0.75, false),
    (
        "delete-account",
        Target::Control,
        r"(delete|remove|close|deactivate) (my )?account",
        0.90,
        true,
    ),
    (
        "submit-payment",
        Target::Control,
        r"pay now|submit payment|place order|complete (purchase|payment)|\bpay\b",
        0.90,
        true,
    ),
    (
        "confirm-transaction",
        Target::Control,
        r"\bconfirm\b|yes, (delete|continue)",
        0.88,
        true,
    ),
    ("login-button", Target::Control, r"\blog ?in\b|\bsign ?in\b", 0.90, true),
    ("checkout-button", Target::Control, r"check ?out", 0.88, true),
    ("update-cart", Target::Control, r"update (cart|basket)", 0.88, true),
    ("send-message", Target::Control, r"\bsend\b", 0.88, true),
    ("close-modal", Target::Control, r"\bclose\b|\bdismiss\b|^.{0,12}[×✕]", 0.86, false),
    (
        "submit-form",
        Target::Control,
        r"submit|sign ?up|register|create account|\bsearch\b|\bgo\b|continue|reset",
        0.88,
        true,
    ),
    ("nav-link", Target::Control, r"^a\b", 0.80, false),
];

pub struct HeuristicLabeler {
    rules: Vec<Rule>,
}

impl HeuristicLabeler {
    pub fn new() -> Result<Self> {
        let rules = RULES
            .iter()
            .map(|(intent, target, pattern, confidence, important)| {
                Ok(Rule {
                    intent: *intent,
                    target: *target,
                    pattern: Regex::new(&format!("(?i){pattern}"))?,
                    confidence: *confidence,
                    important: *important,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn classify(&self, element: &FilteredElement) -> RawLabel {
        let Some(target) = target_of(element) else {
            return RawLabel::new("other", 0.0).at(element.node_index);
        };
        let signature = signature(element);
        let matched = self
            .rules
            .iter()
            .filter(|rule| rule.target == target)
            .find(|rule| rule.pattern.is_match(&signature));
        match matched {
            Some(rule) => {
                trace!(node_index = element.node_index, intent = rule.intent, "heuristic match");
                RawLabel::new(rule.intent, rule.confidence)
                    .at(element.node_index)
                    .important(rule.important)
            }
            None => RawLabel::new("other", 0.0).at(element.node_index),
        }
    }
}

#[async_trait]
impl LabelerPort for HeuristicLabeler {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn label(&self, batch: &Batch) -> Result<Vec<RawLabel>> {
        Ok(batch.elements.iter().map(|el| self.classify(el)).collect())
    }
}

fn input_type(element: &FilteredElement) -> Option<String> {
    element
        .fallback_metadata
        .as_ref()
        .and_then(|meta| meta.input_type.as_deref())
        .map(|value| value.trim().to_ascii_lowercase())
}

fn target_of(element: &FilteredElement) -> Option<Target> {
    let role = element
        .fallback_metadata
        .as_ref()
        .and_then(|meta| meta.role.as_deref())
        .map(|role| role.trim().to_ascii_lowercase());
    match element.tag.as_str() {
        "input" => match input_type(element).as_deref() {
            Some("submit" | "button" | "reset" | "image") => Some(Target::Control),
            Some("hidden" | "checkbox" | "radio" | "file") => None,
            _ => Some(Target::Field),
        },
        "textarea" | "select" => Some(Target::Field),
        "button" | "a" => Some(Target::Control),
        _ if role.as_deref() == Some("button") || role.as_deref() == Some("link") => {
            Some(Target::Control)
        }
        _ if element.clickable => Some(Target::Control),
        _ => None,
    }
}

/// Flat lowercase description the rules match against, tag first.
fn signature(element: &FilteredElement) -> String {
    let mut parts = vec![element.tag.clone()];
    if let Some(kind) = input_type(element) {
        parts.push(format!("type={kind}"));
    }
    if let Some(meta) = element.fallback_metadata.as_ref() {
        for value in [&meta.name, &meta.placeholder, &meta.aria_label, &meta.title, &meta.alt]
            .into_iter()
            .flatten()
        {
            parts.push(value.clone());
        }
    }
    for value in [&element.id, &element.class].into_iter().flatten() {
        parts.push(value.replace(['-', '_'], " "));
    }
    parts.push(element.text.clone());
    parts.join(" ").to_lowercase()
}
