//! Selector builders, one per strategy.

use labelpilot_core_types::{FilteredElement, RawElement};

use crate::types::{Locator, LocatorStrategy};

/// Builds the locator for one strategy, or `None` when the element lacks the datum.
pub fn build(strategy: LocatorStrategy, element: &FilteredElement) -> Option<Locator> {
    match strategy {
        LocatorStrategy::Id => {
            let id = non_empty(element.id.as_deref())?;
            let selector = if is_css_identifier(id) {
                format!("#{id}")
            } else {
                format!("[id=\"{}\"]", escape_attr(id))
            };
            Some(locator(strategy, selector, id))
        }
        LocatorStrategy::AriaLabel => {
            let label = element.fallback_metadata.as_ref()?.aria_label()?;
            Some(locator(
                strategy,
                format!("[aria-label=\"{}\"]", escape_attr(label)),
                label,
            ))
        }
        LocatorStrategy::Class => {
            let token = element.class.as_deref()?.split_whitespace().next()?;
            let selector = if is_css_identifier(token) {
                format!(".{token}")
            } else {
                format!("[class~=\"{}\"]", escape_attr(token))
            };
            Some(locator(strategy, selector, token))
        }
        LocatorStrategy::Text => {
            let text = non_empty(Some(element.text.as_str()))?;
            Some(locator(
                strategy,
                format!(
                    "{}//*[contains(text(),{})]",
                    Locator::XPATH_PREFIX,
                    xpath_literal(text)
                ),
                text,
            ))
        }
    }
}

/// Whether a captured node satisfies the locator on its own attributes.
///
/// Text locators compare against the node's own collapsed text, so callers
/// that hold whole-subtree text should prefer the innermost match.
pub fn matches(locator: &Locator, element: &RawElement) -> bool {
    match locator.strategy {
        LocatorStrategy::Id => element.id.as_deref().map(str::trim) == Some(locator.value.as_str()),
        LocatorStrategy::AriaLabel => element
            .fallback_metadata
            .as_ref()
            .and_then(|meta| meta.aria_label())
            == Some(locator.value.as_str()),
        LocatorStrategy::Class => element
            .class
            .as_deref()
            .map_or(false, |class| class.split_whitespace().any(|t| t == locator.value)),
        LocatorStrategy::Text => collapse(&element.text).contains(locator.value.as_str()),
    }
}

fn locator(strategy: LocatorStrategy, selector: String, value: &str) -> Locator {
    Locator {
        strategy,
        selector,
        value: value.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain CSS identifier: optional dash, then a letter/underscore/non-ASCII,
/// then letters, digits, dashes, underscores or non-ASCII.
fn is_css_identifier(value: &str) -> bool {
    let body = value.strip_prefix('-').unwrap_or(value);
    let mut chars = body.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// XPath 1.0 has no escapes: pick the quote the text lacks, or concat() when it has both.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_check() {
        assert!(is_css_identifier("login-btn"));
        assert!(is_css_identifier("_x9"));
        assert!(is_css_identifier("-foo"));
        assert!(!is_css_identifier("9lives"));
        assert!(!is_css_identifier("a.b"));
        assert!(!is_css_identifier("with space"));
        assert!(!is_css_identifier(""));
    }

    #[test]
    fn xpath_literal_quoting() {
        assert_eq!(xpath_literal("Sign in"), "'Sign in'");
        assert_eq!(xpath_literal("Don't go"), "\"Don't go\"");
        assert_eq!(
            xpath_literal("Say \"hi\" it's"),
            "concat('Say \"hi\" it', \"'\", 's')"
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        assert_eq!(escape_attr(r#"a "b" \c"#), r#"a \"b\" \\c"#);
    }

    #[test]
    fn raw_matching_by_strategy() {
        let raw = RawElement::new("button", "  Sign   in ")
            .with_id("login")
            .with_class("btn primary");
        let by = |strategy, value: &str| Locator {
            strategy,
            selector: String::new(),
            value: value.into(),
        };
        assert!(matches(&by(LocatorStrategy::Id, "login"), &raw));
        assert!(matches(&by(LocatorStrategy::Class, "primary"), &raw));
        assert!(!matches(&by(LocatorStrategy::Class, "btn-primary"), &raw));
        assert!(matches(&by(LocatorStrategy::Text, "Sign in"), &raw));
        assert!(!matches(&by(LocatorStrategy::AriaLabel, "Sign in"), &raw));
    }
}
