//! Selector resolution for labeled elements.
//!
//! Strategies in fallback order:
//! - element id
//! - aria-label
//! - first class token
//! - text content (XPath)

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use types::*;
