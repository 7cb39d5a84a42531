//! Application configuration (`config/config.yaml`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use perceiver_semantic::RemoteLabelerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Policy YAML layered over the builtin defaults.
    pub policy_path: Option<PathBuf>,
    /// Where error screenshots land.
    pub artifacts_dir: PathBuf,
    pub remote_labeler: RemoteLabelerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy_path: None,
            artifacts_dir: PathBuf::from("artifacts"),
            remote_labeler: RemoteLabelerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteLabelerSettings {
    pub api_base: String,
    pub model: String,
    /// Environment variable holding one or more comma separated API keys.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for RemoteLabelerSettings {
    fn default() -> Self {
        let defaults = RemoteLabelerConfig::default();
        Self {
            api_base: defaults.api_base,
            model: defaults.model,
            api_key_env: "LABELPILOT_LABELER_API_KEY".to_string(),
            timeout_secs: defaults.timeout.as_secs(),
            temperature: defaults.temperature,
        }
    }
}

impl RemoteLabelerSettings {
    /// `None` when the key variable is unset or blank.
    pub fn to_labeler_config(&self) -> Option<RemoteLabelerConfig> {
        let raw = env::var(&self.api_key_env).ok()?;
        let api_keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();
        if api_keys.is_empty() {
            return None;
        }
        Some(RemoteLabelerConfig {
            api_keys,
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: AppConfig = serde_yaml::from_str("artifacts_dir: out\n").unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("out"));
        assert!(config.policy_path.is_none());
        assert_eq!(config.remote_labeler.api_key_env, "LABELPILOT_LABELER_API_KEY");
    }

    #[test]
    #[serial]
    fn remote_config_requires_key() {
        let settings = RemoteLabelerSettings {
            api_key_env: "LABELPILOT_TEST_REMOTE_KEY".into(),
            ..RemoteLabelerSettings::default()
        };
        env::remove_var("LABELPILOT_TEST_REMOTE_KEY");
        assert!(settings.to_labeler_config().is_none());

        env::set_var("LABELPILOT_TEST_REMOTE_KEY", "k1, k2,");
        let config = settings.to_labeler_config().unwrap();
        assert_eq!(config.api_keys, vec!["k1", "k2"]);
        env::remove_var("LABELPILOT_TEST_REMOTE_KEY");
    }
}
