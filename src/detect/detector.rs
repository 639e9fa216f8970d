use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    detect::{
        field_model::{FieldCategory, InputField, QuestionContainer, Widget},
        label::normalize_label,
    },
    dom::{
        document::{Document, NodeId},
        error::DomError,
        query::parse_selector,
    },
};

// ============================================================================
// Detector configuration
// ============================================================================

/// Selector strategies, tried in order. Structural signals (ARIA roles)
/// come first; versioned class names are fallbacks that may rot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_container_selectors")]
    pub container_selectors: Vec<String>,

    #[serde(default = "default_label_selectors")]
    pub label_selectors: Vec<String>,

    #[serde(default = "default_file_upload_phrases")]
    pub file_upload_phrases: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            container_selectors: default_container_selectors(),
            label_selectors: default_label_selectors(),
            file_upload_phrases: default_file_upload_phrases(),
        }
    }
}

pub fn default_container_selectors() -> Vec<String> {
    [
        r#"[role="listitem"]"#,
        ".freebirdFormviewerViewItemsItemItem",
        ".geS5n",
        ".m2",
        ".Xb9hP",
        ".AgroKb",
        "fieldset",
        ".form-group",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_label_selectors() -> Vec<String> {
    [
        r#"[role="heading"]"#,
        ".M7eMe",
        ".freebirdFormviewerComponentsQuestionBaseTitle",
        "label",
        "legend",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_file_upload_phrases() -> Vec<String> {
    vec!["Ajouter un fichier".to_string(), "Add file".to_string()]
}

// ============================================================================
// FormDetector
// ============================================================================

struct WidgetSelectors {
    affordance: Selector,
    file_input: Selector,
    radio_group: Selector,
    radio: Selector,
    checkbox: Selector,
    native_select: Selector,
    listbox: Selector,
    textarea: Selector,
    input: Selector,
    interactive: Selector,
}

impl WidgetSelectors {
    fn compile() -> Result<Self, DomError> {
        Ok(Self {
            affordance: parse_selector(r#"button, a, [role="button"], [role="link"]"#)?,
            file_input: parse_selector(r#"input[type="file"]"#)?,
            radio_group: parse_selector(r#"[role="radiogroup"]"#)?,
            radio: parse_selector(r#"[role="radio"], input[type="radio"]"#)?,
            checkbox: parse_selector(r#"[role="checkbox"], input[type="checkbox"]"#)?,
            native_select: parse_selector("select")?,
            listbox: parse_selector(r#"[role="listbox"]"#)?,
            textarea: parse_selector("textarea")?,
            input: parse_selector("input")?,
            interactive: parse_selector(
                r#"input, textarea, select, [role="radio"], [role="checkbox"], [role="listbox"]"#,
            )?,
        })
    }
}

/// Scans a document for question containers and their input widgets.
pub struct FormDetector {
    containers: Vec<Selector>,
    labels: Vec<Selector>,
    file_upload_phrases: Vec<String>,
    widgets: WidgetSelectors,
}

impl FormDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, DomError> {
        let containers = config
            .container_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        let labels = config
            .label_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            containers,
            labels,
            file_upload_phrases: config
                .file_upload_phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .collect(),
            widgets: WidgetSelectors::compile()?,
        })
    }

    /// Fresh snapshot of the question containers currently in the document.
    ///
    /// The first selector strategy that matches anything wins. Nested hits
    /// (option rows rendered as list items) collapse into their outermost
    /// container.
    pub fn find_question_containers(&self, doc: &Document) -> Vec<QuestionContainer> {
        for (index, selector) in self.containers.iter().enumerate() {
            let found = doc.select(doc.body(), selector);
            if found.is_empty() {
                continue;
            }

            let outermost: Vec<NodeId> = found
                .iter()
                .copied()
                .filter(|n| !found.iter().any(|o| o != n && doc.contains(*o, *n)))
                .collect();

            debug!(strategy = index, count = outermost.len(), "question containers found");

            return outermost
                .into_iter()
                .map(|node| QuestionContainer {
                    node,
                    label: self.extract_question_label(doc, node),
                    inputs: self.interactive_elements(doc, node),
                })
                .collect();
        }

        Vec::new()
    }

    /// Question text of a container, or `None` when nothing usable is found.
    pub fn extract_question_label(&self, doc: &Document, container: NodeId) -> Option<String> {
        let non_empty = |raw: &str| {
            let label = normalize_label(raw);
            (!label.is_empty()).then_some(label)
        };

        for selector in &self.labels {
            if let Some(node) = doc.select_first(container, selector) {
                if let Some(label) = non_empty(&doc.text_content(node)) {
                    return Some(label);
                }
            }
        }

        if let Some(label) = doc.attr(container, "aria-label").and_then(non_empty) {
            return Some(label);
        }

        if let Some(ids) = doc.attr(container, "aria-labelledby") {
            let text = ids
                .split_whitespace()
                .filter_map(|id| doc.find_by_id(id))
                .map(|n| doc.text_content(n))
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(label) = non_empty(&text) {
                return Some(label);
            }
        }

        doc.first_text(container).and_then(|t| non_empty(&t))
    }

    /// Primary interactive element of a container.
    ///
    /// File-upload affordances are checked first: they render as a plain
    /// button whose only signal is its visible text.
    pub fn find_input_field(&self, doc: &Document, container: NodeId) -> Option<InputField> {
        let w = &self.widgets;

        if let Some(node) = self.file_upload_affordance(doc, container) {
            return Some(field(node, Widget::FileUpload, FieldCategory::FileUpload, "fileupload"));
        }
        if let Some(node) = doc.select_first(container, &w.file_input) {
            return Some(field(node, Widget::FileUpload, FieldCategory::FileUpload, "fileupload"));
        }

        if let Some(node) = doc.select_first(container, &w.radio_group) {
            return Some(field(node, Widget::RadioGroup, FieldCategory::Radio, "radio"));
        }
        if let Some(node) = doc.select_first(container, &w.radio) {
            return Some(field(node, Widget::RadioGroup, FieldCategory::Radio, "radio"));
        }
        if let Some(node) = doc.select_first(container, &w.checkbox) {
            return Some(field(node, Widget::CheckboxGroup, FieldCategory::Checkbox, "checkbox"));
        }

        if let Some(node) = doc.select_first(container, &w.native_select) {
            return Some(field(node, Widget::NativeSelect, FieldCategory::Select, "select"));
        }
        if let Some(node) = doc.select_first(container, &w.listbox) {
            return Some(field(node, Widget::Listbox, FieldCategory::Select, "select"));
        }

        if let Some(node) = doc.select_first(container, &w.textarea) {
            return Some(field(node, Widget::TextArea, FieldCategory::Textarea, "textarea"));
        }

        doc.select(container, &w.input).into_iter().find_map(|node| {
            let input_type = doc
                .attr(node, "type")
                .map(|t| t.to_lowercase())
                .unwrap_or_else(|| "text".to_string());
            let category = text_category(&input_type)?;
            Some(field(node, Widget::TextInput, category, &input_type))
        })
    }

    fn file_upload_affordance(&self, doc: &Document, container: NodeId) -> Option<NodeId> {
        doc.select(container, &self.widgets.affordance)
            .into_iter()
            .find(|node| {
                let text = doc.text_content(*node).to_lowercase();
                let aria = doc.attr(*node, "aria-label").unwrap_or("").trim().to_lowercase();
                self.file_upload_phrases
                    .iter()
                    .any(|phrase| text == *phrase || aria == *phrase)
            })
    }

    fn interactive_elements(&self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        doc.select(container, &self.widgets.interactive)
            .into_iter()
            .filter(|n| doc.attr(*n, "type") != Some("hidden"))
            .collect()
    }

    /// Whether the container holds radio or checkbox widgets, which need
    /// extra settling time before the host page accepts clicks.
    pub fn has_choice_widgets(&self, doc: &Document, container: NodeId) -> bool {
        doc.select_first(container, &self.widgets.radio).is_some()
            || doc.select_first(container, &self.widgets.checkbox).is_some()
    }
}

fn field(node: NodeId, widget: Widget, category: FieldCategory, input_type: &str) -> InputField {
    InputField {
        node,
        widget,
        category,
        input_type: input_type.to_string(),
    }
}

/// Category of an `<input>` by its type; `None` for non-text controls.
fn text_category(input_type: &str) -> Option<FieldCategory> {
    match input_type {
        "" | "text" | "search" | "password" => Some(FieldCategory::Text),
        "email" => Some(FieldCategory::Email),
        "tel" => Some(FieldCategory::Phone),
        "number" | "range" => Some(FieldCategory::Number),
        "url" => Some(FieldCategory::Url),
        "date" | "datetime-local" | "month" | "week" => Some(FieldCategory::Date),
        "time" => Some(FieldCategory::Time),

        // Explicit non-text inputs
        "hidden" | "submit" | "button" | "reset" | "image" | "file" | "radio" | "checkbox" => None,

        // Unknown → treat as text
        _ => Some(FieldCategory::Text),
    }
}
