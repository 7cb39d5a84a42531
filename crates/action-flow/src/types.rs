//! Run request and result types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use labelpilot_core_types::{LabeledElement, PlanStep, RunId, TaskType};
use labelpilot_policy_center::RunDefaults;
use perceiver_semantic::DomMetrics;
use serde::{Deserialize, Serialize};

pub const INTENT_NOT_FOUND: &str = "intent-not-found";
pub const RECOVERY_HINT: &str = "Retry labeler after DOM settles";
pub const FALLBACK_SUGGESTION: &str = "Try refreshing or entering manually.";

/// Run invocation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunRequest {
    pub url: String,
    pub task_type: String,
    /// Text to type, keyed by intent.
    pub inputs: BTreeMap<String, String>,
    pub use_remote_labeler: bool,
    pub timeout_ms: u64,
    pub dry_run: bool,
    pub debug_overlay: bool,
    pub retry_if_missing: bool,
    pub screenshot_on_error: bool,
    pub log_actions: bool,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            task_type: String::new(),
            inputs: BTreeMap::new(),
            use_remote_labeler: false,
            timeout_ms: 5_000,
            dry_run: false,
            debug_overlay: false,
            retry_if_missing: true,
            screenshot_on_error: true,
            log_actions: true,
        }
    }
}

impl RunRequest {
    pub fn new(url: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            task_type: task_type.into(),
            ..Self::default()
        }
    }

    /// Request seeded from policy run defaults instead of the built-in ones.
    pub fn with_defaults(
        url: impl Into<String>,
        task_type: impl Into<String>,
        defaults: &RunDefaults,
    ) -> Self {
        Self {
            timeout_ms: defaults.timeout_ms,
            retry_if_missing: defaults.retry_if_missing,
            screenshot_on_error: defaults.screenshot_on_error,
            log_actions: defaults.log_actions,
            ..Self::new(url, task_type)
        }
    }

    pub fn with_input(mut self, intent: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(intent.into(), value.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn task(&self) -> TaskType {
        TaskType::new(self.task_type.trim())
    }
}

/// User-facing hint attached to an incomplete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackUi {
    pub message: String,
    pub suggestion: String,
}

impl FallbackUi {
    pub fn for_missing(missing: &[String]) -> Self {
        Self {
            message: format!("Could not find {} on this page.", missing.join(", ")),
            suggestion: FALLBACK_SUGGESTION.to_string(),
        }
    }
}

/// Why a run ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    NavigationFailed,
    ActionTimeout,
    ActionFailed,
    MissingInput,
    UnresolvableSelector,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NavigationFailed => "navigation-failed",
            FailureReason::ActionTimeout => "action-timeout",
            FailureReason::ActionFailed => "action-failed",
            FailureReason::MissingInput => "missing-input",
            FailureReason::UnresolvableSelector => "unresolvable-selector",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RunResult {
    #[serde(rename_all = "camelCase")]
    DryRun {
        planned_actions: Vec<PlanStep>,
        usable_labels: Vec<LabeledElement>,
    },
    #[serde(rename_all = "camelCase")]
    Success {
        actions_taken: Vec<String>,
        time_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    Incomplete {
        reason: String,
        missing_intents: Vec<String>,
        actions_attempted: Vec<String>,
        recovery_hint: String,
        #[serde(rename = "fallbackUI")]
        fallback_ui: FallbackUi,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        reason: FailureReason,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        screenshot_path: Option<String>,
    },
}

impl RunResult {
    pub fn incomplete(missing: Vec<String>, attempted: Vec<String>) -> Self {
        RunResult::Incomplete {
            reason: INTENT_NOT_FOUND.to_string(),
            fallback_ui: FallbackUi::for_missing(&missing),
            missing_intents: missing,
            actions_attempted: attempted,
            recovery_hint: RECOVERY_HINT.to_string(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            RunResult::DryRun { .. } => "dry-run",
            RunResult::Success { .. } => "success",
            RunResult::Incomplete { .. } => "incomplete",
            RunResult::Failure { .. } => "failure",
        }
    }
}

/// What a caller gets back from a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub run_id: RunId,
    pub task_type: TaskType,
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub result: RunResult,
    pub metrics: DomMetrics,
}

/// Debug overlay annotation for one labeled element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMark {
    pub color: String,
    pub intent: String,
    pub confidence: f64,
}

/// Outline for labels that fell back to `other`.
pub const OTHER_OVERLAY_COLOR: &str = "#cccccc";

impl OverlayMark {
    pub fn for_label(label: &LabeledElement) -> Self {
        let color = if label.is_other() {
            OTHER_OVERLAY_COLOR
        } else {
            label.risk.overlay_color()
        };
        Self {
            color: color.to_string(),
            intent: label.intent.clone(),
            confidence: label.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults() {
        let req: RunRequest = serde_json::from_value(json!({
            "url": "https://example.com",
            "taskType": "login"
        }))
        .unwrap();
        assert_eq!(req.timeout_ms, 5_000);
        assert!(req.retry_if_missing);
        assert!(req.screenshot_on_error);
        assert!(req.log_actions);
        assert!(!req.dry_run);
        assert!(!req.debug_overlay);
        assert!(!req.use_remote_labeler);
    }

    #[test]
    fn incomplete_serializes_with_status_tag() {
        let result = RunResult::incomplete(
            vec!["login-button".into()],
            vec!["type input-username".into()],
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "incomplete");
        assert_eq!(value["reason"], "intent-not-found");
        assert_eq!(value["missingIntents"], json!(["login-button"]));
        assert_eq!(value["recoveryHint"], RECOVERY_HINT);
        assert_eq!(
            value["fallbackUI"]["message"],
            "Could not find login-button on this page."
        );
    }

    #[test]
    fn failure_reason_is_kebab_case() {
        let result = RunResult::Failure {
            reason: FailureReason::ActionTimeout,
            error: "timed out".into(),
            screenshot_path: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["reason"], "action-timeout");
        assert!(value.get("screenshotPath").is_none());
    }

    #[test]
    fn dry_run_status_tag() {
        let result = RunResult::DryRun {
            planned_actions: vec![PlanStep::click("nav-link")],
            usable_labels: vec![],
        };
        assert_eq!(serde_json::to_value(&result).unwrap()["status"], "dry-run");
        assert_eq!(result.status(), "dry-run");
    }
}
