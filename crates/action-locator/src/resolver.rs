//! Selector resolution with a fixed fallback chain

use labelpilot_core_types::FilteredElement;
use tracing::debug;

use crate::{errors::LocatorError, strategies, types::*};

/// Turns a matched element's identifying metadata into a locator.
///
/// First match wins along [`LocatorStrategy::fallback_chain`]; identical
/// input always yields the identical selector string.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorResolver;

impl SelectorResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, element: &FilteredElement) -> Result<Locator, LocatorError> {
        for strategy in LocatorStrategy::fallback_chain() {
            if let Some(locator) = strategies::build(strategy, element) {
                debug!(
                    node_index = element.node_index,
                    strategy = strategy.name(),
                    selector = %locator,
                    "selector resolved"
                );
                return Ok(locator);
            }
        }
        Err(LocatorError::Unresolvable {
            node_index: element.node_index,
            tag: element.tag.clone(),
        })
    }
}
