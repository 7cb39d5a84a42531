use labelpilot_core_types::FilteredElement;

/// Approximate token cost of an element: compact JSON length over four, rounded up.
pub fn estimate_tokens(element: &FilteredElement) -> usize {
    let len = serde_json::to_string(element)
        .map(|json| json.len())
        .unwrap_or_else(|_| element.text.len());
    len.div_ceil(4)
}

pub fn estimate_all(elements: &[FilteredElement]) -> usize {
    elements.iter().map(estimate_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longer_text_costs_more() {
        let short = FilteredElement {
            tag: "p".into(),
            text: "hi".into(),
            ..Default::default()
        };
        let long = FilteredElement {
            text: "hi ".repeat(200),
            ..short.clone()
        };
        assert!(estimate_tokens(&long) > estimate_tokens(&short));
        assert!(estimate_tokens(&short) > 0);
    }

    #[test]
    fn estimate_is_json_length_over_four() {
        let el = FilteredElement {
            tag: "a".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&el).unwrap();
        assert_eq!(estimate_tokens(&el), (json.len() + 3) / 4);
    }
}
