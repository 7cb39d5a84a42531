use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use labelpilot_policy_center::PolicyHandle;
use perceiver_semantic::{RemoteLabeler, SharedLabeler};
use tracing::debug;

use crate::config::AppConfig;

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
    policy: PolicyHandle,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf, policy: PolicyHandle) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            policy,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    /// Remote labeler from config, or `None` when no API key is available.
    pub fn remote_labeler(&self) -> Result<Option<SharedLabeler>> {
        let settings = &self.config.remote_labeler;
        let Some(labeler_config) = settings.to_labeler_config() else {
            debug!(env = %settings.api_key_env, "remote labeler not configured");
            return Ok(None);
        };
        let risk = self.policy.risk();
        let intents: Vec<&str> = risk.intents().map(|(intent, _)| intent).collect();
        let labeler = RemoteLabeler::new(labeler_config, intents)
            .context("Failed to build remote labeler")?;
        Ok(Some(Arc::new(labeler)))
    }
}
