//! One run: validate, capture, label, match, execute.

use std::sync::Arc;
use std::time::{Duration, Instant};

use action_locator::SelectorResolver;
use chrono::Utc;
use labelpilot_core_types::{LabeledElement, RunId};
use labelpilot_policy_center::{ActionPlanRegistry, PolicyHandle};
use perceiver_semantic::{HeuristicLabeler, LabelingPipeline, SharedLabeler};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{BrowserError, FlowError};
use crate::executor::{ExecutionOptions, Phase, PlanExecutor};
use crate::matcher::usable_labels;
use crate::metrics;
use crate::ports::BrowserPort;
use crate::types::{FailureReason, OverlayMark, RunOutcome, RunRequest, RunResult};

pub struct AgentRunner {
    browser: Arc<dyn BrowserPort>,
    policy: PolicyHandle,
    pipeline: LabelingPipeline,
    plans: Arc<ActionPlanRegistry>,
    local: SharedLabeler,
    remote: Option<SharedLabeler>,
}

impl AgentRunner {
    /// Runner with the heuristic labeler as the local collaborator.
    pub fn new(browser: Arc<dyn BrowserPort>, policy: PolicyHandle) -> Result<Self, FlowError> {
        let local: SharedLabeler = Arc::new(HeuristicLabeler::new()?);
        Ok(Self {
            browser,
            pipeline: LabelingPipeline::new(&policy),
            policy,
            plans: Arc::new(ActionPlanRegistry::builtin().clone()),
            local,
            remote: None,
        })
    }

    pub fn with_local_labeler(mut self, labeler: SharedLabeler) -> Self {
        self.local = labeler;
        self
    }

    pub fn with_remote_labeler(mut self, labeler: SharedLabeler) -> Self {
        self.remote = Some(labeler);
        self
    }

    pub fn with_plans(mut self, plans: ActionPlanRegistry) -> Self {
        self.plans = Arc::new(plans);
        self
    }

    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    pub fn plans(&self) -> &ActionPlanRegistry {
        &self.plans
    }

    /// `Err` only for requests rejected before any collaborator is called.
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome, FlowError> {
        let labeler = match self.check(&request) {
            Ok(labeler) => labeler,
            Err(err) => {
                metrics::record_rejected();
                return Err(err);
            }
        };

        let started = Instant::now();
        let started_at = Utc::now();
        let run_id = RunId::new();
        let task = request.task();
        let limit = Duration::from_millis(request.timeout_ms);
        let executor = PlanExecutor::new(
            Arc::clone(&self.browser),
            run_id.clone(),
            ExecutionOptions {
                timeout: limit,
                retry_if_missing: request.retry_if_missing,
                screenshot_on_error: request.screenshot_on_error,
                log_actions: request.log_actions,
            },
        );
        info!(run_id = %run_id, task = %task, url = %request.url, "run started");

        let captured = match timeout(limit, self.browser.capture(&request.url)).await {
            Ok(captured) => captured,
            Err(_) => Err(BrowserError::Navigation {
                url: request.url.clone(),
                reason: format!("capture timed out after {}ms", request.timeout_ms),
            }),
        };
        let raw = match captured {
            Ok(raw) => raw,
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "capture failed");
                let screenshot_path = executor.capture_error_screenshot().await;
                let result = RunResult::Failure {
                    reason: FailureReason::NavigationFailed,
                    error: err.to_string(),
                    screenshot_path,
                };
                metrics::record_result(&result, started.elapsed());
                return Ok(RunOutcome {
                    run_id,
                    task_type: task,
                    url: request.url,
                    started_at,
                    result,
                    metrics: Default::default(),
                });
            }
        };

        let outcome = self.pipeline.process(&raw, &*labeler).await;
        let dom_metrics = outcome.metrics;
        let labels = outcome.into_labels();

        if request.debug_overlay {
            self.draw_overlay(&run_id, &labels, limit).await;
        }

        debug!(run_id = %run_id, phase = %Phase::Planning, labels = labels.len(), "planning");
        let usable = usable_labels(&labels, &self.policy.risk());
        let plan = self.plans.get(&task).unwrap_or_default();

        let result = if request.dry_run {
            info!(run_id = %run_id, usable = usable.len(), steps = plan.len(), "dry run");
            RunResult::DryRun {
                planned_actions: plan.to_vec(),
                usable_labels: usable,
            }
        } else {
            executor.execute(plan, &usable, &request.inputs, started).await
        };
        metrics::record_result(&result, started.elapsed());
        info!(run_id = %run_id, status = result.status(), "run finished");

        Ok(RunOutcome {
            run_id,
            task_type: task,
            url: request.url,
            started_at,
            result,
            metrics: dom_metrics,
        })
    }

    fn check(&self, request: &RunRequest) -> Result<SharedLabeler, FlowError> {
        if request.url.trim().is_empty() {
            return Err(FlowError::configuration("url is required"));
        }
        let task = request.task();
        if task.as_str().is_empty() {
            return Err(FlowError::configuration("taskType is required"));
        }
        if !self.plans.contains(&task) {
            return Err(FlowError::configuration(format!("unknown taskType '{task}'")));
        }
        if request.timeout_ms == 0 {
            return Err(FlowError::configuration("timeoutMs must be positive"));
        }
        if request.use_remote_labeler {
            return self
                .remote
                .clone()
                .ok_or_else(|| FlowError::configuration("remote labeler requested but not configured"));
        }
        Ok(Arc::clone(&self.local))
    }

    /// Outlines every label; each highlight is bounded by the action timeout.
    async fn draw_overlay(&self, run_id: &RunId, labels: &[LabeledElement], limit: Duration) {
        let resolver = SelectorResolver::new();
        for label in labels {
            let locator = match resolver.resolve(&label.element) {
                Ok(locator) => locator,
                Err(err) => {
                    debug!(run_id = %run_id, error = %err, "overlay skipped element");
                    continue;
                }
            };
            let mark = OverlayMark::for_label(label);
            match timeout(limit, self.browser.highlight(&locator, &mark)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(run_id = %run_id, selector = %locator, error = %err, "overlay failed");
                }
                Err(_) => {
                    warn!(run_id = %run_id, selector = %locator, "overlay timed out");
                }
            }
        }
    }
}
