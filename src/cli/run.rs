use std::sync::Arc;

use action_flow::{AgentRunner, RunOutcome, RunRequest, RunResult};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::Serialize;

use super::context::CliContext;
use super::counters::PipelineCounters;
use super::output::{emit, OutputFormat};
use crate::snapshot_browser::{RecordedAction, SnapshotBrowser};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Page snapshot (element tree JSON) path or file:// URL
    pub url: String,

    /// Task type from the plan catalogue (e.g. login, search)
    #[arg(short, long)]
    pub task: String,

    /// Text for a type step (intent=value, repeatable)
    #[arg(short, long, value_name = "INTENT=VALUE")]
    pub input: Vec<String>,

    /// Label with the configured remote labeler instead of the heuristic one
    #[arg(long)]
    pub remote: bool,

    /// Plan only; do not act
    #[arg(long)]
    pub dry_run: bool,

    /// Outline labeled elements before acting
    #[arg(long)]
    pub debug_overlay: bool,

    /// Per-action timeout in milliseconds (defaults to the policy value)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Stop at the first missing required intent
    #[arg(long)]
    pub no_retry: bool,

    /// Skip the error screenshot on failure
    #[arg(long)]
    pub no_screenshot: bool,

    /// Print process-wide pipeline counters afterwards
    #[arg(long)]
    pub counters: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a> {
    #[serde(flatten)]
    outcome: &'a RunOutcome,
    browser_actions: Vec<RecordedAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counters: Option<PipelineCounters>,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let browser = Arc::new(SnapshotBrowser::new(ctx.config().artifacts_dir.clone()));
    let mut runner = AgentRunner::new(browser.clone(), ctx.policy().clone())
        .context("Failed to assemble runner")?;
    if args.remote {
        if let Some(remote) = ctx.remote_labeler()? {
            runner = runner.with_remote_labeler(remote);
        }
    }

    let request = build_request(&args, ctx)?;
    let outcome = runner.run(request).await.map_err(|err| anyhow!(err))?;

    let report = RunReport {
        outcome: &outcome,
        browser_actions: browser.actions(),
        counters: args.counters.then(PipelineCounters::snapshot),
    };
    emit(output, &report, || print_human(&report))
}

fn build_request(args: &RunArgs, ctx: &CliContext) -> Result<RunRequest> {
    let snapshot = ctx.policy().snapshot();
    let mut request = RunRequest::with_defaults(&args.url, &args.task, &snapshot.run);
    for raw in &args.input {
        let (intent, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --input '{raw}', expected INTENT=VALUE"))?;
        request = request.with_input(intent.trim(), value);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        request.timeout_ms = timeout_ms;
    }
    request.use_remote_labeler = args.remote;
    request.dry_run = args.dry_run;
    request.debug_overlay = args.debug_overlay;
    if args.no_retry {
        request.retry_if_missing = false;
    }
    if args.no_screenshot {
        request.screenshot_on_error = false;
    }
    Ok(request)
}

fn print_human(report: &RunReport<'_>) {
    let outcome = report.outcome;
    println!("Run {} ({} on {})", outcome.run_id, outcome.task_type, outcome.url);
    println!("Status: {}", outcome.result.status());
    match &outcome.result {
        RunResult::DryRun {
            planned_actions,
            usable_labels,
        } => {
            println!("Planned actions:");
            for step in planned_actions {
                let flag = if step.required { "" } else { " (optional)" };
                println!("  {}{}", step.describe(), flag);
            }
            println!("Usable labels: {}", usable_labels.len());
            for label in usable_labels {
                println!(
                    "  #{:<4} {:<24} {:.2} {:<6} {}",
                    label.node_index(),
                    label.intent,
                    label.confidence,
                    label.risk,
                    label.element.text
                );
            }
        }
        RunResult::Success {
            actions_taken,
            time_ms,
        } => {
            println!("Actions taken ({time_ms} ms): {}", actions_taken.join(", "));
        }
        RunResult::Incomplete {
            missing_intents,
            actions_attempted,
            recovery_hint,
            fallback_ui,
            ..
        } => {
            println!("Missing intents: {}", missing_intents.join(", "));
            println!("Actions attempted: {}", actions_attempted.join(", "));
            println!("Hint: {recovery_hint}");
            println!("{} {}", fallback_ui.message, fallback_ui.suggestion);
        }
        RunResult::Failure {
            reason,
            error,
            screenshot_path,
        } => {
            println!("Reason: {reason}");
            println!("Error: {error}");
            if let Some(path) = screenshot_path {
                println!("Screenshot: {path}");
            }
        }
    }
    let m = &outcome.metrics;
    println!(
        "Elements: original={} labeled={} filtered_out={} high_risk_skipped={} fallback_used={}",
        m.original_element_count,
        m.labeled_element_count,
        m.filtered_out_count,
        m.high_risk_skipped_count,
        m.fallback_used_count
    );
    if !report.browser_actions.is_empty() {
        println!("Browser actions:");
        for action in &report.browser_actions {
            match action {
                RecordedAction::Click { selector } => println!("  click {selector}"),
                RecordedAction::Type { selector, chars } => {
                    println!("  type {selector} ({chars} chars)")
                }
                RecordedAction::Highlight { selector, mark } => println!(
                    "  highlight {selector} {} {} {:.2}",
                    mark.color, mark.intent, mark.confidence
                ),
            }
        }
    }
    if let Some(counters) = &report.counters {
        counters.print_human();
    }
}
