use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use labelpilot_policy_center::{apply_cli_overrides, load_snapshot, PolicyHandle};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::env::LogFormat;
use crate::config::AppConfig;

pub fn load_local_env_overrides() {
    let path = Path::new("config/local.env");
    if !path.exists() {
        return;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            for (idx, raw_line) in contents.lines().enumerate() {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((key, value)) = line.split_once('=') else {
                    warn!(line = idx + 1, "invalid local.env entry; skipping");
                    continue;
                };
                let key = key.trim();
                if key.is_empty() || env::var(key).is_ok() {
                    continue;
                }
                env::set_var(key, unquote(value.trim()));
            }
            info!(path = %path.display(), "Loaded environment overrides from local.env");
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read local.env overrides");
        }
    }
}

/// Logs go to stderr so `--output json` stays machine readable.
pub fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: AppConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!("Loaded configuration from: {}", config_path.display());
        Ok(LoadedConfig {
            config,
            path: config_path,
        })
    } else {
        info!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Ok(LoadedConfig {
            config: AppConfig::default(),
            path: config_path,
        })
    }
}

// Priority: ./config/config.yaml > <config_dir>/labelpilot/config.yaml
fn default_config_path() -> Result<PathBuf> {
    let local_config = PathBuf::from("config/config.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("labelpilot");
    path.push("config.yaml");
    Ok(path)
}

/// Builtin → policy file → env layers, then `--set` pairs with CLI authority.
pub fn load_policy(config: &AppConfig, overrides: &[String]) -> Result<PolicyHandle> {
    let mut snapshot = load_snapshot(config.policy_path.as_deref())
        .map_err(|err| anyhow!(err))
        .context("Failed to load policy")?;
    if !overrides.is_empty() {
        let pairs = overrides
            .iter()
            .map(|raw| {
                raw.split_once('=')
                    .map(|(path, value)| (path.to_string(), value.to_string()))
                    .ok_or_else(|| anyhow!("invalid --set '{raw}', expected PATH=VALUE"))
            })
            .collect::<Result<Vec<_>>>()?;
        apply_cli_overrides(&mut snapshot, &pairs)
            .map_err(|err| anyhow!(err))
            .context("Failed to apply --set overrides")?;
    }
    Ok(PolicyHandle::new(snapshot))
}

fn unquote(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn explicit_config_file_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "artifacts_dir: shots\nremote_labeler:\n  model: tiny\n").unwrap();
        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded.config.artifacts_dir, PathBuf::from("shots"));
        assert_eq!(loaded.config.remote_labeler.model, "tiny");
    }

    #[tokio::test]
    async fn missing_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded.config.artifacts_dir, PathBuf::from("artifacts"));
    }

    #[test]
    #[serial]
    fn set_overrides_replace_policy_values() {
        let handle = load_policy(
            &AppConfig::default(),
            &["confidence.low=0.5".to_string(), "run.timeout_ms=900".to_string()],
        )
        .unwrap();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.confidence.low, 0.5);
        assert_eq!(snapshot.run.timeout_ms, 900);
    }

    #[test]
    #[serial]
    fn malformed_set_is_rejected() {
        let err = load_policy(&AppConfig::default(), &["confidence.low".to_string()]).unwrap_err();
        assert!(err.to_string().contains("PATH=VALUE"));
    }

    #[test]
    fn quoted_values_are_unescaped() {
        assert_eq!(unquote("\"a\\\"b\""), "a\"b");
        assert_eq!(unquote("plain"), "plain");
    }
}
