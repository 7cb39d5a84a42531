//! Structural stages of the labeling pipeline: filter, chunk, batch.

pub mod batcher;
pub mod chunker;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod text;
pub mod tokens;

pub use batcher::Batcher;
pub use chunker::Chunker;
pub use filter::TreeFilter;
pub use model::{Batch, Chunk};
pub use policy::{ChunkOptions, FilterOptions, StructuralPolicyView};
pub use tokens::estimate_tokens;
