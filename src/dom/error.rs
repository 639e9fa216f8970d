use std::fmt;

use crate::dom::document::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Selector text that does not parse as CSS
    InvalidSelector { selector: String, reason: String },

    /// Node id does not refer to an element of this document
    UnknownNode(NodeId),

    /// A page listener threw while an event was being dispatched
    Script { message: String, source: String },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::InvalidSelector { selector, reason } => {
                write!(f, "Invalid selector '{}': {}", selector, reason)
            }
            DomError::UnknownNode(id) => write!(f, "Node {} is not an element", id.0),
            DomError::Script { message, source } => {
                if source.is_empty() {
                    write!(f, "Page script error: {}", message)
                } else {
                    write!(f, "Page script error ({}): {}", source, message)
                }
            }
        }
    }
}

impl std::error::Error for DomError {}
