use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::api::{apply_override_to_snapshot, overlay_rank};
use crate::defaults::default_snapshot;
use crate::errors::PolicyError;
use crate::model::{PolicySnapshot, PolicySource};

const ENV_PREFIX: &str = "LABELPILOT_POLICY__";
const ENV_JSON: &str = "LABELPILOT_POLICY_OVERRIDE_JSON";
const ENV_CLI_OVERRIDES: &str = "LABELPILOT_POLICY_CLI_OVERRIDES";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
    pub include_cli_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
            include_cli_env: true,
        }
    }
}

pub fn load_snapshot(path: Option<&Path>) -> Result<PolicySnapshot, PolicyError> {
    let mut options = LoadOptions::default();
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    options.include_env = true;
    options.include_cli_env = true;
    load_snapshot_with_options(&options)
}

pub fn load_snapshot_with_options(options: &LoadOptions) -> Result<PolicySnapshot, PolicyError> {
    let mut snapshot = default_snapshot();
    bootstrap_builtin_provenance(&mut snapshot)?;

    for path in &options.paths {
        if path.exists() {
            debug!(path = %path.display(), "applying policy file");
            let overlay = overlays_from_file(path)?;
            apply_overlays(&mut snapshot, overlay)?;
        } else {
            debug!(path = %path.display(), "policy file not found, skipping");
        }
    }

    if options.include_env {
        let env_overlays = overlays_from_env()?;
        apply_overlays(&mut snapshot, env_overlays)?;
    }

    if options.include_cli_env {
        let cli_overlays = overlays_from_cli_env()?;
        apply_overlays(&mut snapshot, cli_overlays)?;
    }

    snapshot.normalize();
    validate(&snapshot)?;
    Ok(snapshot)
}

/// Applies `path=value` pairs with CLI authority on top of an existing snapshot.
pub fn apply_cli_overrides(
    snapshot: &mut PolicySnapshot,
    pairs: &[(String, String)],
) -> Result<(), PolicyError> {
    let overlays = pairs
        .iter()
        .map(|(path, raw)| PolicyOverlay {
            path: path.trim().to_ascii_lowercase(),
            value: parse_env_value(raw.trim()),
            source: PolicySource::Cli,
        })
        .collect();
    apply_overlays(snapshot, overlays)?;
    snapshot.normalize();
    validate(snapshot)
}

fn validate(snapshot: &PolicySnapshot) -> Result<(), PolicyError> {
    let c = &snapshot.confidence;
    if !(c.low <= c.medium && c.medium <= c.high) {
        return Err(PolicyError::Invalid(format!(
            "confidence thresholds must be ordered low <= medium <= high (got {} / {} / {})",
            c.low, c.medium, c.high
        )));
    }
    if snapshot.tokens.safety_margin >= snapshot.tokens.max_tokens_per_call {
        return Err(PolicyError::Invalid(format!(
            "tokens.safety_margin ({}) must be below tokens.max_tokens_per_call ({})",
            snapshot.tokens.safety_margin, snapshot.tokens.max_tokens_per_call
        )));
    }
    if snapshot.run.timeout_ms == 0 {
        return Err(PolicyError::Invalid("run.timeout_ms must be positive".into()));
    }
    Ok(())
}

struct PolicyOverlay {
    path: String,
    value: Value,
    source: PolicySource,
}

fn apply_overlays(
    snapshot: &mut PolicySnapshot,
    mut overlays: Vec<PolicyOverlay>,
) -> Result<(), PolicyError> {
    overlays.sort_by_key(|overlay| overlay_rank(&overlay.path));
    for overlay in overlays {
        apply_override_to_snapshot(snapshot, &overlay.path, &overlay.value, overlay.source)?;
    }
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<PolicyOverlay>, PolicyError> {
    let content = fs::read_to_string(path).map_err(|err| PolicyError::Io(format!("{}", err)))?;
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    Ok(flatten_value(json_value, None, PolicySource::File))
}

fn overlays_from_env() -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    for (key, raw) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let path = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase().replace('_', "-"))
                .collect::<Vec<_>>();
            if path.is_empty() {
                continue;
            }
            overlays.push(PolicyOverlay {
                path: env_path(&path),
                value: parse_env_value(&raw),
                source: PolicySource::Env,
            });
        }
    }

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let json_value: Value = serde_json::from_str(&raw_json)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
            overlays.extend(flatten_value(json_value, None, PolicySource::Env));
        }
    }

    Ok(overlays)
}

// Env keys cannot carry '-', so intent names use '_' there. Field names keep it.
fn env_path(segments: &[String]) -> String {
    let is_risk = segments.first().map(|s| s == "risk").unwrap_or(false);
    segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| {
            if is_risk && idx == 1 {
                segment.clone()
            } else {
                segment.replace('-', "_")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn overlays_from_cli_env() -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    if let Ok(raw) = env::var(ENV_CLI_OVERRIDES) {
        for token in raw.split(',') {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Some((path, value_raw)) = trimmed.split_once('=') else {
                continue;
            };
            let path = path.trim();
            if path.is_empty() {
                continue;
            }
            overlays.push(PolicyOverlay {
                path: path.to_ascii_lowercase(),
                value: parse_env_value(value_raw.trim()),
                source: PolicySource::Cli,
            });
        }
    }
    Ok(overlays)
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: PolicySource) -> Vec<PolicyOverlay> {
    match value {
        Value::Object(map) => {
            let mut result = Vec::new();
            for (key, value) in map {
                let key_segment = key.trim().to_ascii_lowercase();
                let next_prefix = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, key_segment),
                    Some(_) => key_segment.clone(),
                    None => key_segment.clone(),
                };
                result.extend(flatten_value(value, Some(next_prefix), source));
            }
            result
        }
        other => {
            if let Some(prefix) = prefix {
                vec![PolicyOverlay {
                    path: prefix,
                    value: other,
                    source,
                }]
            } else {
                Vec::new()
            }
        }
    }
}

fn bootstrap_builtin_provenance(snapshot: &mut PolicySnapshot) -> Result<(), PolicyError> {
    let mut overlays = Vec::new();
    for (section, value) in [
        ("confidence", serde_json::to_value(&snapshot.confidence)),
        ("filter", serde_json::to_value(&snapshot.filter)),
        ("tokens", serde_json::to_value(&snapshot.tokens)),
        ("run", serde_json::to_value(&snapshot.run)),
    ] {
        let value = value.map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
        overlays.extend(flatten_value(value, Some(section.into()), PolicySource::Builtin));
    }
    for intent in snapshot.risk.keys() {
        overlays.push(PolicyOverlay {
            path: format!("risk.{intent}.tier"),
            value: Value::Null,
            source: PolicySource::Builtin,
        });
    }

    for overlay in overlays {
        snapshot.set_provenance(&overlay.path, overlay.source);
    }
    Ok(())
}
