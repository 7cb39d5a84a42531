//! Bounded, deterministic pruning of a captured element tree.

use std::time::Instant;

use labelpilot_core_types::{FilteredElement, RawElement};
use tracing::debug;

use crate::metrics;
use crate::policy::FilterOptions;
use crate::text::clean_text;

#[derive(Clone, Debug, Default)]
pub struct TreeFilter {
    options: FilterOptions,
}

impl TreeFilter {
    pub fn new(options: FilterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Returns `None` when the root itself is excluded or pruned.
    pub fn filter(&self, tree: &RawElement) -> Option<FilteredElement> {
        let started = Instant::now();
        let mut filtered = filter_node(tree, 0, &self.options);
        if let Some(root) = filtered.as_mut() {
            let mut next = 0;
            assign_indices(root, &mut next);
        }
        let kept = filtered.as_ref().map_or(0, FilteredElement::node_count);
        metrics::record_filter(tree.node_count(), kept, started.elapsed());
        debug!(original = tree.node_count(), kept, "element tree filtered");
        filtered
    }
}

fn filter_node(raw: &RawElement, depth: usize, options: &FilterOptions) -> Option<FilteredElement> {
    if options.is_excluded_tag(&raw.tag) {
        return None;
    }
    if options.matches_excluded_pattern(raw.class.as_deref(), raw.id.as_deref()) {
        return None;
    }

    let text = clean_text(&raw.text, options.max_text_length);
    let children: Vec<FilteredElement> = if depth < options.max_depth {
        raw.children
            .iter()
            .take(options.max_children)
            .filter_map(|child| filter_node(child, depth + 1, options))
            .collect()
    } else {
        Vec::new()
    };

    if text.chars().count() < options.min_text_length
        && children.is_empty()
        && !options.is_important_tag(&raw.tag)
    {
        return None;
    }

    Some(FilteredElement {
        node_index: 0,
        tag: raw.tag.to_ascii_lowercase(),
        text,
        id: non_blank(raw.id.as_deref()),
        class: non_blank(raw.class.as_deref()),
        bounding_box: raw.bounding_box,
        clickable: raw.clickable,
        visible: raw.visible,
        disabled: raw.disabled,
        fallback_metadata: raw.fallback_metadata.clone(),
        children,
    })
}

fn assign_indices(node: &mut FilteredElement, next: &mut usize) {
    node.node_index = *next;
    *next += 1;
    for child in node.children.iter_mut() {
        assign_indices(child, next);
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
