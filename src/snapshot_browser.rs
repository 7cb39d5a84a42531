//! File-backed `BrowserPort`: pages are captured element trees saved as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use action_flow::{BrowserError, BrowserPort, OverlayMark};
use action_locator::{strategies, Locator, LocatorStrategy};
use async_trait::async_trait;
use labelpilot_core_types::RawElement;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

const FORM_CONTROLS: &[&str] = &["input", "textarea", "select", "button"];

/// Something the snapshot browser was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RecordedAction {
    Click { selector: String },
    Type { selector: String, chars: usize },
    Highlight { selector: String, mark: OverlayMark },
}

pub struct SnapshotBrowser {
    artifacts_dir: PathBuf,
    page: Mutex<Option<RawElement>>,
    actions: Mutex<Vec<RecordedAction>>,
}

impl SnapshotBrowser {
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            page: Mutex::new(None),
            actions: Mutex::new(Vec::new()),
        }
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.actions.lock().clone()
    }

    /// Reads a snapshot from a path or `file://` URL.
    pub fn load(url: &str) -> Result<RawElement, BrowserError> {
        let path = snapshot_path(url);
        let navigation = |reason: String| BrowserError::Navigation {
            url: url.to_string(),
            reason,
        };
        let content = fs::read_to_string(&path)
            .map_err(|err| navigation(format!("{}: {err}", path.display())))?;
        let mut tree: RawElement =
            serde_json::from_str(&content).map_err(|err| navigation(format!("invalid snapshot: {err}")))?;
        label_form_controls(&mut tree);
        Ok(tree)
    }

    fn find(&self, locator: &Locator) -> Result<RawElement, BrowserError> {
        let page = self.page.lock();
        let root = page
            .as_ref()
            .ok_or_else(|| BrowserError::Unavailable("no page captured".into()))?;
        find_match(root, locator)
            .cloned()
            .ok_or_else(|| BrowserError::NotFound(locator.to_string()))
    }

    fn interactable(&self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find(locator)?;
        if element.disabled || !element.visible {
            return Err(BrowserError::Action {
                selector: locator.to_string(),
                reason: "element is not interactable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserPort for SnapshotBrowser {
    async fn capture(&self, url: &str) -> Result<RawElement, BrowserError> {
        let tree = Self::load(url)?;
        info!(url, nodes = tree.node_count(), "snapshot captured");
        *self.page.lock() = Some(tree.clone());
        Ok(tree)
    }

    async fn wait_for_selector(&self, locator: &Locator) -> Result<(), BrowserError> {
        self.find(locator).map(|_| ())
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        self.interactable(locator)?;
        self.actions.lock().push(RecordedAction::Click {
            selector: locator.to_string(),
        });
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        self.interactable(locator)?;
        self.actions.lock().push(RecordedAction::Type {
            selector: locator.to_string(),
            chars: text.chars().count(),
        });
        Ok(())
    }

    async fn screenshot(&self, name: &str) -> Result<PathBuf, BrowserError> {
        let failed = |err: String| BrowserError::Screenshot(err);
        fs::create_dir_all(&self.artifacts_dir).map_err(|err| failed(err.to_string()))?;
        let path = self.artifacts_dir.join(name);
        let page = self.page.lock().clone();
        let body = serde_json::to_vec_pretty(&page).map_err(|err| failed(err.to_string()))?;
        fs::write(&path, body).map_err(|err| failed(err.to_string()))?;
        debug!(path = %path.display(), "snapshot artifact written");
        Ok(path)
    }

    async fn highlight(&self, locator: &Locator, mark: &OverlayMark) -> Result<(), BrowserError> {
        self.find(locator)?;
        self.actions.lock().push(RecordedAction::Highlight {
            selector: locator.to_string(),
            mark: mark.clone(),
        });
        Ok(())
    }
}

fn snapshot_path(url: &str) -> PathBuf {
    match url.strip_prefix("file://") {
        Some(rest) => PathBuf::from(rest),
        None => Path::new(url).to_path_buf(),
    }
}

/// Form controls carry no text node; give them the label a user would read.
fn label_form_controls(node: &mut RawElement) {
    let tag = node.tag.to_ascii_lowercase();
    if node.text.trim().is_empty() && FORM_CONTROLS.contains(&tag.as_str()) {
        if let Some(meta) = node.fallback_metadata.as_ref() {
            let label = [&meta.aria_label, &meta.placeholder, &meta.name, &meta.title]
                .into_iter()
                .flatten()
                .map(|value| value.trim())
                .find(|value| !value.is_empty());
            if let Some(label) = label {
                node.text = label.to_string();
            }
        }
    }
    for child in &mut node.children {
        label_form_controls(child);
    }
}

/// Pre-order first match; text locators prefer the innermost matching node.
fn find_match<'a>(node: &'a RawElement, locator: &Locator) -> Option<&'a RawElement> {
    if locator.strategy == LocatorStrategy::Text {
        if let Some(inner) = node
            .children
            .iter()
            .find_map(|child| find_match(child, locator))
        {
            return Some(inner);
        }
        return strategies::matches(locator, node).then_some(node);
    }
    if strategies::matches(locator, node) {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| find_match(child, locator))
}
