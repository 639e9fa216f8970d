use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::dom::{document::NodeId, error::DomError};

/// Attribute carrying the arena id of each element in the rendered markup.
pub(crate) const NODE_ID_ATTR: &str = "data-autofill-node";

/// Elements the HTML parser closes immediately; their arena children are
/// not rendered.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn parse_selector(text: &str) -> Result<Selector, DomError> {
    if text.trim().is_empty() {
        return Err(DomError::InvalidSelector {
            selector: text.to_string(),
            reason: "empty selector".to_string(),
        });
    }
    Selector::parse(text).map_err(|e| DomError::InvalidSelector {
        selector: text.to_string(),
        reason: e.to_string(),
    })
}

/// Parsed HTML image of one arena tree. Selectors run against it and their
/// hits map back to arena ids through [`NODE_ID_ATTR`].
#[derive(Debug, Clone)]
pub(crate) struct HtmlIndex {
    html: Html,
}

impl HtmlIndex {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn matching(&self, selector: &Selector) -> HashSet<NodeId> {
        self.html
            .select(selector)
            .filter_map(|el| el.value().attr(NODE_ID_ATTR))
            .filter_map(|raw| raw.parse().ok())
            .map(NodeId)
            .collect()
    }
}

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Tag and attribute names the tokenizer reads back unchanged.
pub(crate) fn is_markup_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '='))
}

pub(crate) fn escape_text(raw: &str, out: &mut String) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn escape_attr(raw: &str, out: &mut String) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_malformed_selectors_are_rejected() {
        assert!(parse_selector("").is_err());
        assert!(parse_selector("   ").is_err());
        assert!(parse_selector("div >").is_err());
        assert!(parse_selector("a,,b").is_err());
        let err = parse_selector("#").unwrap_err();
        assert!(err.to_string().starts_with("Invalid selector '#'"));
    }

    #[test]
    fn full_css_syntax_parses() {
        assert!(parse_selector(r#"[aria-label^="Add"]"#).is_ok());
        assert!(parse_selector("div:not(.x) ~ span").is_ok());
        assert!(parse_selector(r#"[class~="m2"], li:nth-child(2)"#).is_ok());
    }

    #[test]
    fn hits_map_back_to_node_ids() {
        let index = HtmlIndex::parse(&format!(
            r#"<!DOCTYPE html><html><head></head><body {a}="1"><div {a}="2" class="q"></div><div class="q"></div></body></html>"#,
            a = NODE_ID_ATTR
        ));
        let hits = index.matching(&parse_selector(".q").unwrap());
        assert_eq!(hits, HashSet::from([NodeId(2)]));
    }

    #[test]
    fn markup_names_exclude_tokenizer_delimiters() {
        assert!(is_markup_name("aria-label"));
        assert!(!is_markup_name("a b"));
        assert!(!is_markup_name("1st"));
        assert!(!is_markup_name(""));
    }

    #[test]
    fn escaping_keeps_markup_inert() {
        let mut out = String::new();
        escape_text("a<b & c", &mut out);
        assert_eq!(out, "a&lt;b &amp; c");
        out.clear();
        escape_attr(r#"say "hi""#, &mut out);
        assert_eq!(out, "say &quot;hi&quot;");
    }
}
