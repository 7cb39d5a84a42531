use std::sync::Arc;

use labelpilot_core_types::RiskTier;
use serde_json::Value;

use crate::errors::PolicyError;
use crate::model::{IntentRule, PolicySnapshot, PolicySource};
use crate::risk::RiskPolicy;

/// Read-only view over a loaded policy, shared across concurrent runs.
#[derive(Clone, Debug)]
pub struct PolicyHandle {
    snapshot: Arc<PolicySnapshot>,
    risk: Arc<RiskPolicy>,
}

impl PolicyHandle {
    pub fn new(mut snapshot: PolicySnapshot) -> Self {
        snapshot.normalize();
        let risk = Arc::new(RiskPolicy::from_snapshot(&snapshot));
        Self {
            snapshot: Arc::new(snapshot),
            risk,
        }
    }

    pub fn revision(&self) -> u64 {
        self.snapshot.rev
    }

    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn risk(&self) -> Arc<RiskPolicy> {
        Arc::clone(&self.risk)
    }
}

impl Default for PolicyHandle {
    fn default() -> Self {
        Self::new(crate::defaults::default_snapshot())
    }
}

pub(crate) fn apply_override_to_snapshot(
    snapshot: &mut PolicySnapshot,
    path: &str,
    value: &Value,
    source: PolicySource,
) -> Result<(), PolicyError> {
    let changed = match path {
        "confidence.high" => merge_threshold(&mut snapshot.confidence.high, to_unit(value)?, source),
        "confidence.medium" => {
            merge_threshold(&mut snapshot.confidence.medium, to_unit(value)?, source)
        }
        "confidence.low" => merge_threshold(&mut snapshot.confidence.low, to_unit(value)?, source),
        "filter.max_depth" => merge_usize(
            &mut snapshot.filter.max_depth,
            to_usize(value)?,
            source,
        ),
        "filter.max_children" => merge_usize(
            &mut snapshot.filter.max_children,
            to_usize(value)?,
            source,
        ),
        "filter.max_text_length" => merge_usize(
            &mut snapshot.filter.max_text_length,
            to_usize(value)?,
            source,
        ),
        "filter.min_text_length" => {
            replace(&mut snapshot.filter.min_text_length, to_usize(value)?)
        }
        "filter.exclude_tags" => merge_list(
            &mut snapshot.filter.exclude_tags,
            to_string_list(value)?,
            source,
        ),
        "filter.exclude_patterns" => merge_list(
            &mut snapshot.filter.exclude_patterns,
            to_string_list(value)?,
            source,
        ),
        "filter.important_tags" => {
            replace(&mut snapshot.filter.important_tags, to_string_list(value)?)
        }
        "tokens.max_tokens_per_call" => merge_usize(
            &mut snapshot.tokens.max_tokens_per_call,
            to_usize(value)?,
            source,
        ),
        "tokens.safety_margin" => {
            let candidate = to_usize(value)?;
            let original = snapshot.tokens.safety_margin;
            snapshot.tokens.safety_margin = if is_authoritative(source) {
                candidate
            } else {
                original.max(candidate)
            };
            snapshot.tokens.safety_margin != original
        }
        "run.timeout_ms" => replace(&mut snapshot.run.timeout_ms, to_u64(value)?),
        "run.retry_if_missing" => replace(&mut snapshot.run.retry_if_missing, to_bool(value)?),
        "run.screenshot_on_error" => {
            replace(&mut snapshot.run.screenshot_on_error, to_bool(value)?)
        }
        "run.log_actions" => replace(&mut snapshot.run.log_actions, to_bool(value)?),
        path if path.starts_with("risk.") => apply_risk_override(snapshot, path, value, source)?,
        path => return Err(PolicyError::UnsupportedPath(path.to_string())),
    };
    if changed {
        record_provenance(snapshot, path, source);
    }
    Ok(())
}

fn apply_risk_override(
    snapshot: &mut PolicySnapshot,
    path: &str,
    value: &Value,
    source: PolicySource,
) -> Result<bool, PolicyError> {
    let rest = &path["risk.".len()..];
    let Some((intent, field)) = rest.rsplit_once('.') else {
        return Err(PolicyError::UnsupportedPath(path.to_string()));
    };
    if intent.is_empty() {
        return Err(PolicyError::UnsupportedPath(path.to_string()));
    }

    match field {
        "tier" => {
            let tier: RiskTier = to_str(value)?
                .parse()
                .map_err(|err| PolicyError::InvalidValue(format!("{err}")))?;
            let floor = snapshot.confidence.for_tier(tier);
            match snapshot.risk.get_mut(intent) {
                Some(rule) => {
                    let original = rule.tier;
                    if is_authoritative(source) {
                        rule.tier = tier;
                    } else if tier > original {
                        rule.tier = tier;
                        rule.min_confidence = rule.min_confidence.max(floor);
                    }
                    Ok(rule.tier != original)
                }
                None => {
                    snapshot.risk.insert(
                        intent.to_string(),
                        IntentRule {
                            tier,
                            min_confidence: floor,
                        },
                    );
                    Ok(true)
                }
            }
        }
        "min_confidence" => {
            let candidate = to_unit(value)?;
            let rule = snapshot.risk.get_mut(intent).ok_or_else(|| {
                PolicyError::UnsupportedPath(format!("{path} (declare risk.{intent}.tier first)"))
            })?;
            Ok(merge_threshold(&mut rule.min_confidence, candidate, source))
        }
        _ => Err(PolicyError::UnsupportedPath(path.to_string())),
    }
}

/// Ordering applied before overlays so thresholds exist before intents use them.
pub(crate) fn overlay_rank(path: &str) -> u8 {
    if path.starts_with("confidence.") {
        0
    } else if path.starts_with("risk.") && path.ends_with(".tier") {
        1
    } else {
        2
    }
}

fn is_authoritative(source: PolicySource) -> bool {
    matches!(source, PolicySource::Cli)
}

fn merge_threshold(target: &mut f64, candidate: f64, source: PolicySource) -> bool {
    let original = *target;
    if is_authoritative(source) {
        *target = candidate;
    } else {
        *target = (*target).max(candidate);
    }
    (*target - original).abs() > f64::EPSILON
}

fn merge_usize(target: &mut usize, candidate: usize, source: PolicySource) -> bool {
    let original = *target;
    if is_authoritative(source) {
        *target = candidate;
    } else {
        *target = (*target).min(candidate);
    }
    *target != original
}

fn merge_list(target: &mut Vec<String>, candidate: Vec<String>, source: PolicySource) -> bool {
    let original = target.clone();
    if is_authoritative(source) {
        *target = candidate;
    } else {
        for item in candidate {
            if !target.iter().any(|existing| existing.eq_ignore_ascii_case(&item)) {
                target.push(item);
            }
        }
    }
    *target != original
}

fn replace<T: PartialEq>(target: &mut T, candidate: T) -> bool {
    let changed = *target != candidate;
    *target = candidate;
    changed
}

fn record_provenance(snapshot: &mut PolicySnapshot, path: &str, source: PolicySource) {
    snapshot.set_provenance(path, source);
}

fn to_usize(value: &Value) -> Result<usize, PolicyError> {
    to_u64(value).map(|v| v as usize)
}

fn to_u64(value: &Value) -> Result<u64, PolicyError> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected integer, got {value}")))
}

fn to_unit(value: &Value) -> Result<f64, PolicyError> {
    let number = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected number, got {value}")))?;
    if !(0.0..=1.0).contains(&number) {
        return Err(PolicyError::InvalidValue(format!(
            "confidence {number} outside [0, 1]"
        )));
    }
    Ok(number)
}

fn to_bool(value: &Value) -> Result<bool, PolicyError> {
    value
        .as_bool()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected bool, got {value}")))
}

fn to_str(value: &Value) -> Result<&str, PolicyError> {
    value
        .as_str()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected string, got {value}")))
}

fn to_string_list(value: &Value) -> Result<Vec<String>, PolicyError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| to_str(item).map(|s| s.trim().to_ascii_lowercase()))
            .collect(),
        Value::String(raw) => Ok(raw
            .split(',')
            .map(|item| item.trim().to_ascii_lowercase())
            .filter(|item| !item.is_empty())
            .collect()),
        other => Err(PolicyError::InvalidValue(format!(
            "expected list, got {other}"
        ))),
    }
}
