use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{filler::outcome::FillOutcome, mapping::profile::UserProfile};

/// A runtime message addressed to the page, keyed by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    FillForm {
        /// Replaces the profile before filling
        #[serde(default, rename = "userData", skip_serializing_if = "Option::is_none")]
        user_data: Option<Value>,
    },
    GetUserProfile,
    GetFieldMappings,
    HighlightUnfilledFields,
    RemoveHighlights,
}

/// Reply sent back over the channel. Only the fields relevant to the
/// request are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<FillOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn error(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn failure(message: impl ToString) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Self::default()
        }
    }
}
