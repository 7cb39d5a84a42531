//! Labeler output and per-run metric shapes
use labelpilot_core_types::LabeledElement;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unvalidated label as reported by a labeler.
///
/// Every field is optional; whatever is missing or malformed is treated as
/// absent and the validator downgrades accordingly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
}

impl RawLabel {
    pub fn new(intent: impl Into<String>, confidence: f64) -> Self {
        Self {
            intent: Some(intent.into()),
            confidence: Some(confidence),
            ..Self::default()
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn important(mut self, important: bool) -> Self {
        self.important = Some(important);
        self
    }

    /// Lenient field-by-field read; never fails.
    pub fn from_value(value: &Value) -> Self {
        let index = value
            .get("index")
            .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
            .map(|v| v as usize);
        let intent = value
            .get("intent")
            .and_then(Value::as_str)
            .map(str::to_string);
        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()));
        let risk = value.get("risk").and_then(Value::as_str).map(str::to_string);
        let important = value.get("important").and_then(Value::as_bool);
        Self {
            index,
            intent,
            confidence,
            risk,
            important,
        }
    }
}

/// Element counts at each pipeline stage for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomMetrics {
    pub original_element_count: usize,
    pub filtered_out_count: usize,
    pub labeled_element_count: usize,
    pub high_risk_skipped_count: usize,
    pub fallback_used_count: usize,
}

/// Validated elements of one chunk, in document order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledChunk {
    pub context: String,
    pub elements: Vec<LabeledElement>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelingOutcome {
    pub chunks: Vec<LabeledChunk>,
    pub metrics: DomMetrics,
    /// Batches whose labeler call failed and were downgraded wholesale.
    pub absorbed_faults: usize,
}

impl LabelingOutcome {
    pub fn labels(&self) -> impl Iterator<Item = &LabeledElement> {
        self.chunks.iter().flat_map(|chunk| chunk.elements.iter())
    }

    pub fn into_labels(self) -> Vec<LabeledElement> {
        self.chunks
            .into_iter()
            .flat_map(|chunk| chunk.elements)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_parse_tolerates_bad_fields() {
        let label = RawLabel::from_value(&json!({
            "index": "3",
            "intent": "search-box",
            "confidence": "0.91",
            "important": "yes"
        }));
        assert_eq!(label.index, Some(3));
        assert_eq!(label.intent.as_deref(), Some("search-box"));
        assert_eq!(label.confidence, Some(0.91));
        assert_eq!(label.important, None);

        let empty = RawLabel::from_value(&json!(42));
        assert_eq!(empty, RawLabel::default());
    }

    #[test]
    fn metrics_serialize_camel_case() {
        let value = serde_json::to_value(DomMetrics::default()).unwrap();
        assert!(value.get("originalElementCount").is_some());
        assert!(value.get("highRiskSkippedCount").is_some());
    }
}
