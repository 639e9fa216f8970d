use crate::{
    dom::{document::Document, error::DomError, query::parse_selector},
    filler::outcome::{DetectionResult, HighlightResult, RemoveHighlightsResult},
};

pub const DEFAULT_HIGHLIGHT_CLASS: &str = "autofill-highlight-unfilled";

/// Mark the containers of results needing attention. Containers already
/// carrying the class are not counted again.
pub fn highlight_unfilled(
    doc: &mut Document,
    results: &[DetectionResult],
    class: &str,
) -> Result<HighlightResult, DomError> {
    let mut highlighted_count = 0;
    for result in results.iter().filter(|r| r.needs_attention()) {
        if !doc.is_connected(result.container) {
            continue;
        }
        if doc.add_class(result.container, class)? {
            highlighted_count += 1;
        }
    }
    Ok(HighlightResult {
        success: true,
        highlighted_count,
    })
}

/// Strip the highlight class from every element carrying it.
pub fn remove_highlights(doc: &mut Document, class: &str) -> Result<RemoveHighlightsResult, DomError> {
    let selector = parse_selector(&format!(".{}", class))?;
    let mut removed_count = 0;
    for node in doc.select(doc.root(), &selector) {
        if doc.remove_class(node, class)? {
            removed_count += 1;
        }
    }
    Ok(RemoveHighlightsResult {
        success: true,
        removed_count,
    })
}
