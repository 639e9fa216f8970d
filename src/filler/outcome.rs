use serde::{Deserialize, Serialize};

use crate::{detect::field_model::FieldCategory, dom::document::NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldStatus {
    Filled,
    Unmatched,
    NoInput,
    /// Matched but deliberately left for the user (file uploads)
    Flagged,
    Failed,
}

/// Per-container record of one fill pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub question_label: String,
    pub matched: bool,
    /// Matched field key, or the widget category when unmatched
    pub key: String,
    pub value: Option<String>,
    pub input_type: String,
    pub field_category: FieldCategory,
    pub has_input_field: bool,
    pub filled: bool,
    pub status: FieldStatus,
    #[serde(skip, default = "detached")]
    pub container: NodeId,
}

fn detached() -> NodeId {
    NodeId(usize::MAX)
}

impl DetectionResult {
    /// Results worth pointing the user at after a pass: anything unmatched,
    /// and matched inputs that were left empty.
    pub fn needs_attention(&self) -> bool {
        !self.matched || (self.has_input_field && !self.filled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub question_label: String,
    pub message: String,
}

/// Aggregate result of one fill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    pub success: bool,
    pub fields_filled: usize,
    pub fields_detected: usize,
    pub fields_skipped: usize,
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FillOutcome {
    pub fn failure(message: impl ToString) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            ..Self::default()
        }
    }
}

/// Session statistics; reset at the start of each pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillStatistics {
    pub passes: u32,
    pub detection_results: Vec<DetectionResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightResult {
    pub success: bool,
    pub highlighted_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveHighlightsResult {
    pub success: bool,
    pub removed_count: usize,
}
