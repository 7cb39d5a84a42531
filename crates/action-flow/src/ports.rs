use std::path::PathBuf;

use action_locator::Locator;
use async_trait::async_trait;
use labelpilot_core_types::RawElement;

use crate::errors::BrowserError;
use crate::types::OverlayMark;

/// Browser automation collaborator.
#[async_trait]
pub trait BrowserPort: Send + Sync {
    /// Navigates to `url` and captures its element tree.
    async fn capture(&self, url: &str) -> Result<RawElement, BrowserError>;

    async fn wait_for_selector(&self, locator: &Locator) -> Result<(), BrowserError>;

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError>;

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    /// Saves a screenshot under `name` and returns where it landed.
    async fn screenshot(&self, name: &str) -> Result<PathBuf, BrowserError>;

    /// Outlines a labeled element for debugging.
    async fn highlight(&self, _locator: &Locator, _mark: &OverlayMark) -> Result<(), BrowserError> {
        Ok(())
    }
}
