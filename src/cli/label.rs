use anyhow::{anyhow, Context, Result};
use clap::Args;
use perceiver_semantic::{HeuristicLabeler, LabelingOutcome, LabelingPipeline, SharedLabeler};
use serde::Serialize;
use std::sync::Arc;

use super::context::CliContext;
use super::counters::PipelineCounters;
use super::output::{emit, OutputFormat};
use crate::snapshot_browser::SnapshotBrowser;

#[derive(Args, Clone, Debug)]
pub struct LabelArgs {
    /// Page snapshot (element tree JSON) path or file:// URL
    pub url: String,

    /// Label with the configured remote labeler instead of the heuristic one
    #[arg(long)]
    pub remote: bool,

    /// Include elements validated as `other`
    #[arg(long)]
    pub all: bool,

    /// Print process-wide pipeline counters afterwards
    #[arg(long)]
    pub counters: bool,
}

#[derive(Serialize)]
struct LabelReport {
    #[serde(flatten)]
    outcome: LabelingOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    counters: Option<PipelineCounters>,
}

pub async fn cmd_label(args: LabelArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let labeler: SharedLabeler = if args.remote {
        ctx.remote_labeler()?
            .ok_or_else(|| anyhow!("remote labeler requested but not configured"))?
    } else {
        Arc::new(HeuristicLabeler::new().context("Failed to build heuristic labeler")?)
    };

    let tree = SnapshotBrowser::load(&args.url).map_err(|err| anyhow!(err))?;
    let pipeline = LabelingPipeline::new(ctx.policy());
    let mut outcome = pipeline.process(&tree, &*labeler).await;
    if !args.all {
        for chunk in &mut outcome.chunks {
            chunk.elements.retain(|label| !label.is_other());
        }
    }

    let report = LabelReport {
        outcome,
        counters: args.counters.then(PipelineCounters::snapshot),
    };
    emit(output, &report, || print_human(&report))
}

fn print_human(report: &LabelReport) {
    for chunk in &report.outcome.chunks {
        if chunk.elements.is_empty() {
            continue;
        }
        println!("[{}]", chunk.context);
        for label in &chunk.elements {
            let star = if label.important { "*" } else { " " };
            println!(
                "  #{:<4}{} {:<24} {:.2} {:<6} <{}> {}",
                label.node_index(),
                star,
                label.intent,
                label.confidence,
                label.risk.as_str(),
                label.element.tag,
                label.element.text
            );
        }
    }
    let m = &report.outcome.metrics;
    println!(
        "Elements: original={} labeled={} filtered_out={} high_risk_skipped={} fallback_used={}",
        m.original_element_count,
        m.labeled_element_count,
        m.filtered_out_count,
        m.high_risk_skipped_count,
        m.fallback_used_count
    );
    if report.outcome.absorbed_faults > 0 {
        println!("Labeler faults absorbed: {}", report.outcome.absorbed_faults);
    }
    if let Some(counters) = &report.counters {
        counters.print_human();
    }
}
