use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Serialized DOM snapshots (what the page extractor emits)
// ============================================================================

/// A failure raised by a page-side event listener when an event is
/// dispatched to the element. `source` is the script URL or stack text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFault {
    pub message: String,
    #[serde(default)]
    pub source: String,
}

/// One node of a serialized DOM tree.
///
/// A node without `tag` is a text node carrying `text`. An element with
/// `text` gets that text as its first child, which keeps fixtures short.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,

    #[serde(
        rename = "listenerError",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub listener_error: Option<ScriptFault>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl NodeSnapshot {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::default()
        }
    }

    pub fn text_node(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: NodeSnapshot) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_listener_error(mut self, message: &str, source: &str) -> Self {
        self.listener_error = Some(ScriptFault {
            message: message.to_string(),
            source: source.to_string(),
        });
        self
    }

    pub fn is_text(&self) -> bool {
        self.tag.is_none()
    }
}

/// A whole page as captured by the extractor: location plus body tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub body: NodeSnapshot,
}

impl PageSnapshot {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
