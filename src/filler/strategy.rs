use chrono::NaiveDate;

use crate::{
    boundary::error_boundary::ErrorBoundary,
    detect::{
        field_model::{FieldCategory, InputField, Widget},
        label::match_key,
    },
    dom::{
        document::{Document, EventKind, NodeId},
        query::parse_selector,
    },
    filler::error::FillError,
    mapping::profile::ProfileValue,
};

/// What a strategy did with a matched field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Filled,
    /// Left for the user; content scripts cannot drive file pickers
    Flagged,
}

/// Widget-specific fill. `label` is only used in error reports.
pub fn apply(
    doc: &mut Document,
    field: &InputField,
    container: NodeId,
    label: &str,
    value: &ProfileValue,
    boundary: &ErrorBoundary,
) -> Result<Applied, FillError> {
    match field.widget {
        Widget::FileUpload => Ok(Applied::Flagged),
        Widget::TextInput | Widget::TextArea => {
            fill_text(doc, field, label, &value.display(), boundary).map(|_| Applied::Filled)
        }
        Widget::RadioGroup => fill_radio(doc, container, label, value, boundary).map(|_| Applied::Filled),
        Widget::CheckboxGroup => {
            fill_checkbox(doc, container, label, value, boundary).map(|_| Applied::Filled)
        }
        Widget::NativeSelect => {
            fill_native_select(doc, field.node, label, value, boundary).map(|_| Applied::Filled)
        }
        Widget::Listbox => fill_listbox(doc, field.node, label, value, boundary).map(|_| Applied::Filled),
    }
}

fn fire(doc: &mut Document, boundary: &ErrorBoundary, node: NodeId, kind: EventKind) -> Result<(), FillError> {
    doc.dispatch(node, kind)
        .or_else(|e| boundary.filter(e))
        .map_err(FillError::Dom)
}

fn click(doc: &mut Document, boundary: &ErrorBoundary, node: NodeId) -> Result<(), FillError> {
    doc.click(node).or_else(|e| boundary.filter(e)).map_err(FillError::Dom)
}

// ============================================================================
// Text-like controls
// ============================================================================

fn fill_text(
    doc: &mut Document,
    field: &InputField,
    label: &str,
    raw: &str,
    boundary: &ErrorBoundary,
) -> Result<(), FillError> {
    let node = field.node;
    if doc.is_disabled(node) {
        return Err(FillError::Disabled { label: label.to_string() });
    }
    if doc.is_readonly(node) {
        return Err(FillError::ReadOnly { label: label.to_string() });
    }

    let value = if field.category == FieldCategory::Date && field.input_type == "date" {
        normalize_date(raw).ok_or_else(|| FillError::InvalidDate {
            label: label.to_string(),
            value: raw.to_string(),
        })?
    } else {
        raw.to_string()
    };

    fire(doc, boundary, node, EventKind::Focus)?;
    doc.set_value(node, &value)?;
    fire(doc, boundary, node, EventKind::Input)?;
    fire(doc, boundary, node, EventKind::Change)?;
    fire(doc, boundary, node, EventKind::Blur)
}

/// ISO form of a date value. Day-first is preferred for slash dates;
/// month-first is accepted only when day-first cannot parse.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
}

// ============================================================================
// Choice widgets
// ============================================================================

/// Visible name of an option element.
fn option_label(doc: &Document, node: NodeId) -> String {
    for attr in ["aria-label", "data-value"] {
        if let Some(v) = doc.attr(node, attr).filter(|v| !v.trim().is_empty()) {
            return v.trim().to_string();
        }
    }
    let text = doc.text_content(node);
    if !text.is_empty() {
        return text;
    }
    if let Some(id) = doc.attr(node, "id") {
        if let Ok(Some(label)) = doc.query(doc.root(), &format!(r#"label[for="{}"]"#, id)) {
            return doc.text_content(label);
        }
    }
    if let Ok(label_sel) = parse_selector("label") {
        if let Some(label) = doc.closest(node, &label_sel) {
            return doc.text_content(label);
        }
    }
    doc.attr(node, "value").unwrap_or("").trim().to_string()
}

/// Exact (case/separator-insensitive) match first, then containment.
fn pick_option(doc: &Document, options: &[NodeId], wanted: &str) -> Option<NodeId> {
    let wanted_key = match_key(wanted);
    if wanted_key.is_empty() {
        return None;
    }
    let labelled: Vec<(NodeId, String)> = options
        .iter()
        .map(|o| (*o, match_key(&option_label(doc, *o))))
        .collect();

    labelled
        .iter()
        .find(|(_, l)| *l == wanted_key)
        .or_else(|| {
            labelled
                .iter()
                .find(|(_, l)| !l.is_empty() && l.contains(&wanted_key))
        })
        .map(|(o, _)| *o)
}

fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "true" | "1" | "oui" | "x" | "on" | "checked"
    )
}

fn fill_radio(
    doc: &mut Document,
    container: NodeId,
    label: &str,
    value: &ProfileValue,
    boundary: &ErrorBoundary,
) -> Result<(), FillError> {
    let options = doc.query_all(container, r#"[role="radio"], input[type="radio"]"#)?;
    let wanted = value.display();
    let option = pick_option(doc, &options, &wanted).ok_or_else(|| FillError::OptionNotFound {
        label: label.to_string(),
        value: wanted.clone(),
    })?;
    if doc.is_disabled(option) {
        return Err(FillError::Disabled { label: label.to_string() });
    }
    if !doc.is_checked(option) {
        click(doc, boundary, option)?;
    }
    Ok(())
}

fn fill_checkbox(
    doc: &mut Document,
    container: NodeId,
    label: &str,
    value: &ProfileValue,
    boundary: &ErrorBoundary,
) -> Result<(), FillError> {
    let options = doc.query_all(container, r#"[role="checkbox"], input[type="checkbox"]"#)?;
    let choices = value.choices();

    let mut targets = Vec::new();
    for choice in &choices {
        match pick_option(doc, &options, choice) {
            Some(option) => targets.push(option),
            None if options.len() == 1 && choices.len() == 1 && is_affirmative(choice) => {
                targets.push(options[0]);
            }
            None => {
                return Err(FillError::OptionNotFound {
                    label: label.to_string(),
                    value: choice.clone(),
                });
            }
        }
    }

    for option in targets {
        if !doc.is_checked(option) {
            click(doc, boundary, option)?;
        }
    }
    Ok(())
}

fn fill_native_select(
    doc: &mut Document,
    select: NodeId,
    label: &str,
    value: &ProfileValue,
    boundary: &ErrorBoundary,
) -> Result<(), FillError> {
    if doc.is_disabled(select) {
        return Err(FillError::Disabled { label: label.to_string() });
    }
    let options = doc.query_all(select, "option")?;
    let wanted = value.display();
    let chosen = pick_option(doc, &options, &wanted)
        .or_else(|| {
            options
                .iter()
                .copied()
                .find(|o| doc.attr(*o, "value").is_some_and(|v| match_key(v) == match_key(&wanted)))
        })
        .ok_or_else(|| FillError::OptionNotFound {
            label: label.to_string(),
            value: wanted.clone(),
        })?;

    for option in &options {
        if *option != chosen {
            doc.remove_attribute(*option, "selected")?;
        }
    }
    doc.set_attribute(chosen, "selected", "")?;
    let option_value = doc
        .attr(chosen, "value")
        .map(str::to_string)
        .unwrap_or_else(|| doc.text_content(chosen));
    doc.set_value(select, &option_value)?;
    fire(doc, boundary, select, EventKind::Input)?;
    fire(doc, boundary, select, EventKind::Change)
}

fn fill_listbox(
    doc: &mut Document,
    listbox: NodeId,
    label: &str,
    value: &ProfileValue,
    boundary: &ErrorBoundary,
) -> Result<(), FillError> {
    let options = doc.query_all(listbox, r#"[role="option"]"#)?;
    let wanted = value.display();
    let option = pick_option(doc, &options, &wanted).ok_or_else(|| FillError::OptionNotFound {
        label: label.to_string(),
        value: wanted.clone(),
    })?;
    if doc.is_checked(option) {
        return Ok(());
    }
    click(doc, boundary, listbox)?;
    click(doc, boundary, option)
}
