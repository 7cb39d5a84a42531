//! Plan execution: match, resolve, act under a timeout.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use action_locator::{Locator, SelectorResolver};
use labelpilot_core_types::{ActionKind, LabeledElement, PlanStep, RunId};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::BrowserError;
use crate::matcher::best_match;
use crate::ports::BrowserPort;
use crate::types::{FailureReason, RunResult};

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Executing,
    Success,
    Incomplete,
    Failure,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Planning => "planning",
            Phase::Executing => "executing",
            Phase::Success => "success",
            Phase::Incomplete => "incomplete",
            Phase::Failure => "failure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutionOptions {
    pub timeout: Duration,
    pub retry_if_missing: bool,
    pub screenshot_on_error: bool,
    pub log_actions: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            retry_if_missing: true,
            screenshot_on_error: true,
            log_actions: true,
        }
    }
}

pub struct PlanExecutor {
    browser: Arc<dyn BrowserPort>,
    resolver: SelectorResolver,
    run_id: RunId,
    options: ExecutionOptions,
}

struct StepFault {
    reason: FailureReason,
    error: String,
}

impl PlanExecutor {
    pub fn new(browser: Arc<dyn BrowserPort>, run_id: RunId, options: ExecutionOptions) -> Self {
        Self {
            browser,
            resolver: SelectorResolver::new(),
            run_id,
            options,
        }
    }

    /// Runs `plan` against `usable` labels. `started` is the run start, used for `timeMs`.
    pub async fn execute(
        &self,
        plan: &[PlanStep],
        usable: &[LabeledElement],
        inputs: &BTreeMap<String, String>,
        started: Instant,
    ) -> RunResult {
        debug!(run_id = %self.run_id, phase = %Phase::Executing, steps = plan.len(), "executing plan");
        let mut taken: Vec<String> = Vec::new();
        let mut missing: Vec<String> = Vec::new();

        for step in plan {
            let Some(target) = best_match(usable, &step.intent) else {
                if step.required {
                    warn!(run_id = %self.run_id, intent = %step.intent, "required intent not found");
                    missing.push(step.intent.clone());
                    if !self.options.retry_if_missing {
                        break;
                    }
                } else {
                    debug!(run_id = %self.run_id, intent = %step.intent, "optional intent not found; skipping");
                }
                continue;
            };

            if let Err(fault) = self.perform(step, target, inputs).await {
                warn!(
                    run_id = %self.run_id,
                    phase = %Phase::Failure,
                    step = %step.describe(),
                    reason = %fault.reason,
                    error = %fault.error,
                    "action failed; aborting run"
                );
                let screenshot_path = self.capture_error_screenshot().await;
                return RunResult::Failure {
                    reason: fault.reason,
                    error: fault.error,
                    screenshot_path,
                };
            }
            taken.push(step.describe());
        }

        if missing.is_empty() {
            let time_ms = started.elapsed().as_millis() as u64;
            info!(run_id = %self.run_id, phase = %Phase::Success, actions = taken.len(), time_ms, "plan completed");
            RunResult::Success {
                actions_taken: taken,
                time_ms,
            }
        } else {
            info!(
                run_id = %self.run_id,
                phase = %Phase::Incomplete,
                missing = ?missing,
                attempted = taken.len(),
                "plan incomplete"
            );
            RunResult::incomplete(missing, taken)
        }
    }

    async fn perform(
        &self,
        step: &PlanStep,
        target: &LabeledElement,
        inputs: &BTreeMap<String, String>,
    ) -> Result<(), StepFault> {
        let text = match step.action {
            ActionKind::Type => Some(inputs.get(&step.intent).ok_or_else(|| StepFault {
                reason: FailureReason::MissingInput,
                error: format!("no input value provided for {}", step.intent),
            })?),
            ActionKind::Click => None,
        };

        let locator = self.resolver.resolve(&target.element).map_err(|err| StepFault {
            reason: FailureReason::UnresolvableSelector,
            error: err.to_string(),
        })?;

        let limit = self.options.timeout;
        match timeout(limit, self.act(step.action, &locator, text.map(String::as_str))).await {
            Ok(Ok(())) => {
                if self.options.log_actions {
                    info!(
                        run_id = %self.run_id,
                        action = %step.action,
                        intent = %step.intent,
                        selector = %locator,
                        confidence = target.confidence,
                        "action executed"
                    );
                }
                Ok(())
            }
            Ok(Err(err)) => Err(StepFault {
                reason: FailureReason::ActionFailed,
                error: err.to_string(),
            }),
            Err(_) => Err(StepFault {
                reason: FailureReason::ActionTimeout,
                error: format!(
                    "{} on {} timed out after {}ms",
                    step.describe(),
                    locator,
                    limit.as_millis()
                ),
            }),
        }
    }

    async fn act(
        &self,
        action: ActionKind,
        locator: &Locator,
        text: Option<&str>,
    ) -> Result<(), BrowserError> {
        self.browser.wait_for_selector(locator).await?;
        match action {
            ActionKind::Click => self.browser.click(locator).await,
            ActionKind::Type => self.browser.type_text(locator, text.unwrap_or_default()).await,
        }
    }

    /// Best effort; a failing or hung screenshot never replaces the original
    /// error. Bounded by the action timeout.
    pub async fn capture_error_screenshot(&self) -> Option<String> {
        if !self.options.screenshot_on_error {
            return None;
        }
        let name = error_screenshot_name(&self.run_id);
        match timeout(self.options.timeout, self.browser.screenshot(&name)).await {
            Ok(Ok(path)) => Some(path.display().to_string()),
            Ok(Err(err)) => {
                warn!(run_id = %self.run_id, error = %err, "error screenshot failed");
                None
            }
            Err(_) => {
                warn!(
                    run_id = %self.run_id,
                    timeout_ms = self.options.timeout.as_millis() as u64,
                    "error screenshot timed out"
                );
                None
            }
        }
    }
}

pub fn error_screenshot_name(run_id: &RunId) -> String {
    format!("error_{run_id}.png")
}
