//! Semantic stage of the labeling pipeline.
//!
//! A [`LabelerPort`] proposes intents for batches of filtered elements; the
//! [`LabelValidator`] decides which proposals are trusted, and the
//! [`LabelingPipeline`] ties the structural stages, labeling and validation
//! together while counting elements with a [`MetricsAggregator`].
pub mod aggregate;
pub mod errors;
pub mod heuristic;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod ports;
pub mod remote;
pub mod validator;

// Re-exports
pub use aggregate::MetricsAggregator;
pub use errors::{LabelingError, Result};
pub use heuristic::HeuristicLabeler;
pub use models::{DomMetrics, LabeledChunk, LabelingOutcome, RawLabel};
pub use pipeline::{LabelingPipeline, SharedLabeler};
pub use ports::LabelerPort;
pub use remote::{parse_labels, RemoteLabeler, RemoteLabelerConfig};
pub use validator::{LabelValidator, Validation};
