use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::dom::{
    document::{Document, MutationRecord, NodeId},
    error::DomError,
    query::parse_selector,
};

/// Structural class names and roles a freshly rendered question carries.
/// Host pages rotate these, so any one of them is enough.
pub const QUESTION_SIGNATURES: &[&str] = &[
    r#"[role="listitem"]"#,
    ".freebirdFormviewerViewItemsItemItem",
    ".geS5n",
    ".m2",
    ".Xb9hP",
    ".AgroKb",
];

const FORM_ELEMENT_SIGNATURE: &str =
    r#"input, textarea, select, [role="radio"], [role="checkbox"], [role="listbox"]"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_true")]
    pub child_list: bool,
    #[serde(default = "default_true")]
    pub subtree: bool,
    #[serde(default = "default_attribute_filter")]
    pub attribute_filter: Vec<String>,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attribute_filter: default_attribute_filter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_attribute_filter() -> Vec<String> {
    vec!["role".into(), "class".into(), "data-params".into()]
}

/// How strongly a mutation batch suggests new questions appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MutationSignal {
    None,
    /// Some input-like element was added
    FormElements,
    /// A question container was added
    NewQuestion,
}

pub struct MutationObserver {
    config: ObserverConfig,
    question: Selector,
    form_elements: Selector,
}

impl MutationObserver {
    pub fn new(config: ObserverConfig) -> Result<Self, DomError> {
        Ok(Self {
            question: parse_selector(&QUESTION_SIGNATURES.join(", "))?,
            form_elements: parse_selector(FORM_ELEMENT_SIGNATURE)?,
            config,
        })
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Whether a record falls inside the observed scope.
    pub fn observes(&self, doc: &Document, record: &MutationRecord) -> bool {
        let (target, in_scope) = match record {
            MutationRecord::ChildList { target, .. } => (*target, self.config.child_list),
            MutationRecord::Attributes { target, name } => (
                *target,
                self.config.attribute_filter.iter().any(|a| a == name),
            ),
        };
        if !in_scope {
            return false;
        }
        let body = doc.body();
        target == body || (self.config.subtree && doc.contains(body, target))
    }

    /// Strongest signal across the added nodes of a batch.
    ///
    /// Attribute records are observed but never raise a signal.
    pub fn classify(&self, doc: &Document, records: &[MutationRecord]) -> MutationSignal {
        records
            .iter()
            .filter(|r| self.observes(doc, r))
            .filter_map(|r| match r {
                MutationRecord::ChildList { added, .. } => Some(added),
                MutationRecord::Attributes { .. } => None,
            })
            .flatten()
            .map(|&node| self.classify_node(doc, node))
            .max()
            .unwrap_or(MutationSignal::None)
    }

    fn classify_node(&self, doc: &Document, node: NodeId) -> MutationSignal {
        if !doc.is_element(node) {
            return MutationSignal::None;
        }
        if doc.matches(node, &self.question) || doc.select_first(node, &self.question).is_some() {
            return MutationSignal::NewQuestion;
        }
        if doc.select_first(node, &self.form_elements).is_some() {
            return MutationSignal::FormElements;
        }
        MutationSignal::None
    }
}
