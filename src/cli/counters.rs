use serde::Serialize;

/// Process-wide pipeline counters across every stage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PipelineCounters {
    pub structural: perceiver_structural::metrics::StructuralMetrics,
    pub labeling: perceiver_semantic::metrics::LabelingMetrics,
    pub runs: action_flow::metrics::RunMetrics,
}

impl PipelineCounters {
    pub fn snapshot() -> Self {
        Self {
            structural: perceiver_structural::metrics::snapshot(),
            labeling: perceiver_semantic::metrics::snapshot(),
            runs: action_flow::metrics::snapshot(),
        }
    }

    pub fn print_human(&self) {
        println!();
        println!("Counters");
        println!(
            "  filter: {} runs ({:.2} ms avg), {} → {} nodes",
            self.structural.filter.total,
            self.structural.filter.avg_ms,
            self.structural.nodes_in,
            self.structural.nodes_kept
        );
        println!(
            "  chunks: {}  batches: {} ({} oversized)",
            self.structural.chunks, self.structural.batches, self.structural.oversized_batches
        );
        println!(
            "  labeling: {} runs, {} batches ({:.2} ms avg), {} absorbed faults, {} downgraded",
            self.labeling.runs,
            self.labeling.batches.total,
            self.labeling.batches.avg_ms,
            self.labeling.absorbed_faults,
            self.labeling.downgraded
        );
        println!(
            "  runs: dry-run={} success={} incomplete={} failure={} rejected={}",
            self.runs.dry_run,
            self.runs.success,
            self.runs.incomplete,
            self.runs.failure,
            self.runs.rejected
        );
    }
}
