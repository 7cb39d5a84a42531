//! Partitions a filtered tree into context-tagged chunks.

use labelpilot_core_types::FilteredElement;
use tracing::debug;

use crate::metrics;
use crate::model::Chunk;
use crate::policy::ChunkOptions;
use crate::tokens::estimate_tokens;

const BODY_TAGS: &[&str] = &["body", "html"];
const LISTING_TAGS: &[&str] = &["ul", "ol", "dl", "div"];

pub const MAIN_CONTENT: &str = "Main Content";

#[derive(Clone, Debug, Default)]
pub struct Chunker {
    options: ChunkOptions,
}

impl Chunker {
    pub fn new(options: ChunkOptions) -> Self {
        Self { options }
    }

    pub fn chunk(&self, root: &FilteredElement) -> Vec<Chunk> {
        let mut emitter = Emitter::new(self.options.max_tokens_per_call);
        emitter.defer(root.shallow());

        let region = if is_body_like(root) {
            root.children.iter().position(is_content_region)
        } else {
            None
        };

        let mut content_sections = 0;
        for (idx, child) in root.children.iter().enumerate() {
            if Some(idx) == region {
                split_region(child, &mut emitter);
            } else {
                content_sections += 1;
                emitter.emit(
                    format!("Content Section {content_sections}"),
                    flatten(child),
                );
            }
        }

        let chunks = emitter.finish();
        metrics::record_chunks(chunks.len());
        debug!(
            chunks = chunks.len(),
            content_region = region.is_some(),
            "filtered tree chunked"
        );
        chunks
    }
}

fn split_region(region: &FilteredElement, emitter: &mut Emitter) {
    emitter.defer(region.shallow());
    let mut main: Vec<FilteredElement> = Vec::new();
    let mut listings = 0;
    for child in &region.children {
        if is_listing(child) {
            if !main.is_empty() {
                emitter.emit(MAIN_CONTENT.to_string(), std::mem::take(&mut main));
            }
            listings += 1;
            emitter.emit(format!("Paper Listing Section {listings}"), flatten(child));
        } else {
            main.extend(flatten(child));
        }
    }
    if !main.is_empty() {
        emitter.emit(MAIN_CONTENT.to_string(), main);
    }
}

fn is_body_like(node: &FilteredElement) -> bool {
    BODY_TAGS.contains(&node.tag.as_str())
}

fn is_content_region(node: &FilteredElement) -> bool {
    if node.tag == "main" {
        return true;
    }
    let role_is_main = node
        .fallback_metadata
        .as_ref()
        .and_then(|meta| meta.role.as_deref())
        .map_or(false, |role| role.trim().eq_ignore_ascii_case("main"));
    if role_is_main {
        return true;
    }
    [node.id.as_deref(), node.class.as_deref()]
        .into_iter()
        .flatten()
        .map(str::to_ascii_lowercase)
        .any(|value| value.contains("content") || value.contains("main"))
}

fn is_listing(node: &FilteredElement) -> bool {
    LISTING_TAGS.contains(&node.tag.as_str()) && !node.children.is_empty()
}

fn flatten(node: &FilteredElement) -> Vec<FilteredElement> {
    node.preorder().into_iter().map(FilteredElement::shallow).collect()
}

/// Accumulates logical chunks and seals them at the token ceiling.
struct Emitter {
    max_tokens: usize,
    chunks: Vec<Chunk>,
    deferred: Vec<FilteredElement>,
}

impl Emitter {
    fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            chunks: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Queues a container to lead the next chunk emitted.
    fn defer(&mut self, element: FilteredElement) {
        self.deferred.push(element);
    }

    fn emit(&mut self, context: String, elements: Vec<FilteredElement>) {
        let mut current = Chunk::new(context.clone());
        let leading: Vec<FilteredElement> = self.deferred.drain(..).collect();
        for element in leading.into_iter().chain(elements) {
            let cost = estimate_tokens(&element);
            if !current.is_empty() && current.token_estimate + cost > self.max_tokens {
                let sealed = std::mem::replace(&mut current, Chunk::new(context.clone()));
                self.chunks.push(sealed);
            }
            current.token_estimate += cost;
            current.elements.push(element);
        }
        if !current.is_empty() {
            self.chunks.push(current);
        }
    }

    fn finish(mut self) -> Vec<Chunk> {
        if !self.deferred.is_empty() {
            let context = format!("Content Section {}", self.chunks.len() + 1);
            self.emit(context, Vec::new());
        }
        self.chunks
    }
}
