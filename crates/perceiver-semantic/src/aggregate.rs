use labelpilot_core_types::LabeledElement;

use crate::models::DomMetrics;
use crate::validator::Validation;

/// Per-run counter of elements at each pipeline stage.
#[derive(Clone, Debug, Default)]
pub struct MetricsAggregator {
    metrics: DomMetrics,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_original(&mut self, count: usize) {
        self.metrics.original_element_count = count;
        self.refresh_filtered_out();
    }

    pub fn record_validation(&mut self, validation: &Validation) {
        self.record_labeled(&validation.element);
        if validation.high_risk_skipped {
            self.metrics.high_risk_skipped_count += 1;
        }
    }

    pub fn record_labeled(&mut self, element: &LabeledElement) {
        self.metrics.labeled_element_count += 1;
        if element.element.has_fallback() {
            self.metrics.fallback_used_count += 1;
        }
        self.refresh_filtered_out();
    }

    pub fn metrics(&self) -> DomMetrics {
        self.metrics
    }

    pub fn reset(&mut self) {
        self.metrics = DomMetrics::default();
    }

    fn refresh_filtered_out(&mut self) {
        self.metrics.filtered_out_count = self
            .metrics
            .original_element_count
            .saturating_sub(self.metrics.labeled_element_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelpilot_core_types::{FallbackMetadata, FilteredElement, RiskTier};

    fn labeled(meta: Option<FallbackMetadata>) -> LabeledElement {
        LabeledElement {
            element: FilteredElement {
                fallback_metadata: meta,
                ..Default::default()
            },
            intent: "other".into(),
            confidence: 0.0,
            risk: RiskTier::Low,
            important: false,
        }
    }

    #[test]
    fn counts_stages_and_fallbacks() {
        let mut agg = MetricsAggregator::new();
        agg.record_original(10);
        agg.record_labeled(&labeled(None));
        agg.record_labeled(&labeled(Some(FallbackMetadata {
            role: Some("button".into()),
            ..Default::default()
        })));
        agg.record_validation(&Validation {
            element: labeled(None),
            downgraded: true,
            high_risk_skipped: true,
        });
        let m = agg.metrics();
        assert_eq!(m.original_element_count, 10);
        assert_eq!(m.labeled_element_count, 3);
        assert_eq!(m.filtered_out_count, 7);
        assert_eq!(m.fallback_used_count, 1);
        assert_eq!(m.high_risk_skipped_count, 1);
    }

    #[test]
    fn filtered_out_saturates() {
        let mut agg = MetricsAggregator::new();
        agg.record_labeled(&labeled(None));
        assert_eq!(agg.metrics().filtered_out_count, 0);
        agg.reset();
        assert_eq!(agg.metrics(), DomMetrics::default());
    }
}
