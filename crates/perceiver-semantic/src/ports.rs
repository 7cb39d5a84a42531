use async_trait::async_trait;
use perceiver_structural::Batch;

use crate::errors::Result;
use crate::models::RawLabel;

/// Semantic labeling service consumed by the pipeline.
///
/// Labels are aligned to the batch by `index` (the element's node index)
/// when present, otherwise by position.
#[async_trait]
pub trait LabelerPort: Send + Sync {
    fn name(&self) -> &str;

    async fn label(&self, batch: &Batch) -> Result<Vec<RawLabel>>;
}
