//! Captured and filtered element trees.

use serde::{Deserialize, Serialize};

/// Viewport-relative geometry reported by the browser at capture time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Secondary identifying attributes used when an element has no id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FallbackMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
}

impl FallbackMetadata {
    /// True when any of aria-label, role, title or alt carries a value.
    pub fn has_fallback(&self) -> bool {
        [&self.aria_label, &self.role, &self.title, &self.alt]
            .iter()
            .any(|value| value.as_deref().map_or(false, |v| !v.trim().is_empty()))
    }

    /// Non-empty aria-label, trimmed.
    pub fn aria_label(&self) -> Option<&str> {
        self.aria_label
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// One node of the tree produced by the browser collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawElement {
    pub tag: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    pub clickable: bool,
    pub visible: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_metadata: Option<FallbackMetadata>,
    pub children: Vec<RawElement>,
}

impl RawElement {
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            visible: true,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_child(mut self, child: RawElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RawElement>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_metadata(mut self, metadata: FallbackMetadata) -> Self {
        self.fallback_metadata = Some(metadata);
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    /// Number of nodes in this subtree, root included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// A node that survived tree filtering.
///
/// `node_index` is the pre-order position inside the filtered tree and is
/// the identity used to align labeler output with its input batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilteredElement {
    pub node_index: usize,
    pub tag: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    pub clickable: bool,
    pub visible: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_metadata: Option<FallbackMetadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilteredElement>,
}

impl FilteredElement {
    /// Copy of this node without its children.
    pub fn shallow(&self) -> Self {
        Self {
            node_index: self.node_index,
            tag: self.tag.clone(),
            text: self.text.clone(),
            id: self.id.clone(),
            class: self.class.clone(),
            bounding_box: self.bounding_box,
            clickable: self.clickable,
            visible: self.visible,
            disabled: self.disabled,
            fallback_metadata: self.fallback_metadata.clone(),
            children: Vec::new(),
        }
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback_metadata
            .as_ref()
            .map_or(false, FallbackMetadata::has_fallback)
    }

    pub fn node_count(&self) -> usize {
        self.preorder().len()
    }

    /// All nodes of this subtree in document order.
    pub fn preorder(&self) -> Vec<&FilteredElement> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_element_reads_camel_case_snapshot() {
        let raw: RawElement = serde_json::from_str(
            r#"{
                "tag": "button",
                "text": "Sign in",
                "visible": true,
                "clickable": true,
                "fallbackMetadata": { "ariaLabel": "Sign in", "type": "submit" },
                "children": []
            }"#,
        )
        .unwrap();
        assert_eq!(raw.tag, "button");
        assert!(raw.visible);
        assert!(!raw.disabled);
        let meta = raw.fallback_metadata.unwrap();
        assert_eq!(meta.aria_label(), Some("Sign in"));
        assert_eq!(meta.input_type.as_deref(), Some("submit"));
    }

    #[test]
    fn node_count_includes_nested_children() {
        let tree = RawElement::new("body", "")
            .with_child(RawElement::new("div", "").with_child(RawElement::new("span", "a")))
            .with_child(RawElement::new("p", "b"));
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn fallback_ignores_blank_values_and_placeholders() {
        let meta = FallbackMetadata {
            aria_label: Some("   ".into()),
            placeholder: Some("Search".into()),
            ..Default::default()
        };
        assert!(!meta.has_fallback());

        let meta = FallbackMetadata {
            alt: Some("logo".into()),
            ..Default::default()
        };
        assert!(meta.has_fallback());
    }

    #[test]
    fn preorder_follows_document_order() {
        let leaf = |idx: usize, tag: &str| FilteredElement {
            node_index: idx,
            tag: tag.into(),
            ..Default::default()
        };
        let mut root = leaf(0, "body");
        let mut list = leaf(1, "ul");
        list.children = vec![leaf(2, "li"), leaf(3, "li")];
        root.children = vec![list, leaf(4, "p")];

        let order: Vec<usize> = root.preorder().iter().map(|n| n.node_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert!(root.shallow().children.is_empty());
    }
}
