//! Token-budgeted batching of chunk elements.

use labelpilot_core_types::FilteredElement;
use tracing::warn;

use crate::metrics;
use crate::model::{Batch, Chunk};
use crate::text::truncate_chars;
use crate::tokens::estimate_tokens;

#[derive(Clone, Copy, Debug)]
pub struct Batcher {
    budget: usize,
}

impl Batcher {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn batch_chunk(&self, chunk: &Chunk) -> Vec<Batch> {
        self.batch(&chunk.context, &chunk.elements)
    }

    /// Greedy fill in order. An element over budget is cut down and sent alone.
    pub fn batch(&self, context: &str, elements: &[FilteredElement]) -> Vec<Batch> {
        let mut batches = Vec::new();
        let mut current = self.open(context);

        for element in elements {
            let cost = estimate_tokens(element);
            if cost > self.budget {
                if !current.is_empty() {
                    batches.push(std::mem::replace(&mut current, self.open(context)));
                }
                let trimmed = shrink_to_budget(element, self.budget);
                let token_estimate = estimate_tokens(&trimmed);
                warn!(
                    node_index = element.node_index,
                    original = cost,
                    trimmed = token_estimate,
                    budget = self.budget,
                    "element exceeds batch budget; truncated"
                );
                batches.push(Batch {
                    context: context.to_string(),
                    elements: vec![trimmed],
                    token_estimate,
                    oversized: true,
                });
                continue;
            }
            if !current.is_empty() && current.token_estimate + cost > self.budget {
                batches.push(std::mem::replace(&mut current, self.open(context)));
            }
            current.token_estimate += cost;
            current.elements.push(element.clone());
        }
        if !current.is_empty() {
            batches.push(current);
        }

        let oversized = batches.iter().filter(|b| b.oversized).count();
        metrics::record_batches(batches.len(), oversized);
        batches
    }

    fn open(&self, context: &str) -> Batch {
        Batch {
            context: context.to_string(),
            ..Batch::default()
        }
    }
}

fn shrink_to_budget(element: &FilteredElement, budget: usize) -> FilteredElement {
    let mut trimmed = element.shallow();
    let mut chars = trimmed.text.chars().count();
    loop {
        let cost = estimate_tokens(&trimmed);
        if cost <= budget || chars == 0 {
            return trimmed;
        }
        let overshoot = (cost - budget) * 4;
        let next = chars.saturating_sub(overshoot).min(chars / 2);
        trimmed.text = truncate_chars(&trimmed.text, next);
        chars = next;
    }
}
