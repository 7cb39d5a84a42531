//! Filter → chunk → batch → label → validate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use labelpilot_core_types::{FilteredElement, RawElement};
use labelpilot_policy_center::PolicyHandle;
use perceiver_structural::{Batch, Batcher, Chunker, StructuralPolicyView, TreeFilter};
use tracing::{debug, info, warn};

use crate::aggregate::MetricsAggregator;
use crate::metrics;
use crate::models::{LabeledChunk, LabelingOutcome, RawLabel};
use crate::ports::LabelerPort;
use crate::validator::LabelValidator;

#[derive(Clone, Debug)]
pub struct LabelingPipeline {
    filter: TreeFilter,
    chunker: Chunker,
    batcher: Batcher,
    validator: LabelValidator,
}

impl LabelingPipeline {
    pub fn new(policy: &PolicyHandle) -> Self {
        let view = StructuralPolicyView::from_snapshot(&policy.snapshot());
        Self {
            filter: TreeFilter::new(view.filter),
            chunker: Chunker::new(view.chunk),
            batcher: Batcher::new(view.chunk.batch_budget),
            validator: LabelValidator::new(policy.risk()),
        }
    }

    pub fn validator(&self) -> &LabelValidator {
        &self.validator
    }

    /// Batches are labeled strictly in order. A failing batch is downgraded
    /// wholesale and never aborts the run.
    pub async fn process(&self, raw: &RawElement, labeler: &dyn LabelerPort) -> LabelingOutcome {
        metrics::record_run();
        let mut aggregator = MetricsAggregator::new();
        aggregator.record_original(raw.node_count());

        let Some(filtered) = self.filter.filter(raw) else {
            info!("element tree filtered to nothing");
            return LabelingOutcome {
                metrics: aggregator.metrics(),
                ..LabelingOutcome::default()
            };
        };

        let mut outcome = LabelingOutcome::default();
        let mut downgraded = 0;
        for chunk in self.chunker.chunk(&filtered) {
            let mut labeled = LabeledChunk {
                context: chunk.context.clone(),
                elements: Vec::with_capacity(chunk.len()),
            };
            for batch in self.batcher.batch_chunk(&chunk) {
                let started = Instant::now();
                let labels = match labeler.label(&batch).await {
                    Ok(labels) if positional_mismatch(&batch, &labels) => {
                        warn!(
                            labeler = labeler.name(),
                            context = %batch.context,
                            elements = batch.len(),
                            labels = labels.len(),
                            "positional reply does not cover the batch; elements left unlabeled"
                        );
                        metrics::record_absorbed_fault();
                        outcome.absorbed_faults += 1;
                        Vec::new()
                    }
                    Ok(labels) => labels,
                    Err(err) => {
                        warn!(
                            labeler = labeler.name(),
                            context = %batch.context,
                            elements = batch.len(),
                            error = %err,
                            "labeling batch failed; elements left unlabeled"
                        );
                        metrics::record_absorbed_fault();
                        outcome.absorbed_faults += 1;
                        Vec::new()
                    }
                };
                metrics::record_batch(started.elapsed());

                for (element, label) in align(&batch, &labels) {
                    let validation = self.validator.validate(element, label);
                    if validation.downgraded {
                        downgraded += 1;
                    }
                    aggregator.record_validation(&validation);
                    labeled.elements.push(validation.element);
                }
            }
            outcome.chunks.push(labeled);
        }
        metrics::record_downgraded(downgraded);

        outcome.metrics = aggregator.metrics();
        debug!(
            labeled = outcome.metrics.labeled_element_count,
            downgraded,
            faults = outcome.absorbed_faults,
            "labeling complete"
        );
        outcome
    }
}

/// A reply without node indices can only be paired one to one. An empty reply
/// leaves the batch unlabeled either way.
fn positional_mismatch(batch: &Batch, labels: &[RawLabel]) -> bool {
    !labels.is_empty()
        && labels.iter().all(|label| label.index.is_none())
        && labels.len() != batch.elements.len()
}

/// Pairs each batch element with its label: by node index when the labeler
/// reports indices, positionally otherwise.
fn align<'a>(
    batch: &Batch,
    labels: &'a [RawLabel],
) -> Vec<(FilteredElement, Option<&'a RawLabel>)> {
    if labels.iter().any(|label| label.index.is_some()) {
        let mut by_index: HashMap<usize, &RawLabel> = HashMap::new();
        for label in labels {
            if let Some(index) = label.index {
                by_index.entry(index).or_insert(label);
            }
        }
        batch
            .elements
            .iter()
            .map(|el| (el.clone(), by_index.get(&el.node_index).copied()))
            .collect()
    } else {
        batch
            .elements
            .iter()
            .enumerate()
            .map(|(pos, el)| (el.clone(), labels.get(pos)))
            .collect()
    }
}

pub type SharedLabeler = Arc<dyn LabelerPort>;
