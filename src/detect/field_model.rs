use serde::{Deserialize, Serialize};

use crate::dom::document::NodeId;

/// Widget category assigned to a question from its input's DOM shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Text,
    Email,
    Phone,
    Number,
    Url,
    Date,
    Time,
    Textarea,
    Radio,
    Checkbox,
    Select,
    FileUpload,
    Other,
}

impl FieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Text => "text",
            FieldCategory::Email => "email",
            FieldCategory::Phone => "phone",
            FieldCategory::Number => "number",
            FieldCategory::Url => "url",
            FieldCategory::Date => "date",
            FieldCategory::Time => "time",
            FieldCategory::Textarea => "textarea",
            FieldCategory::Radio => "radio",
            FieldCategory::Checkbox => "checkbox",
            FieldCategory::Select => "select",
            FieldCategory::FileUpload => "fileupload",
            FieldCategory::Other => "other",
        }
    }

    /// Categories filled by writing a value into a text control.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldCategory::Text
                | FieldCategory::Email
                | FieldCategory::Phone
                | FieldCategory::Number
                | FieldCategory::Url
                | FieldCategory::Date
                | FieldCategory::Time
                | FieldCategory::Textarea
        )
    }
}

/// How the primary control of a question is operated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    TextInput,
    TextArea,
    NativeSelect,
    Listbox,
    RadioGroup,
    CheckboxGroup,
    FileUpload,
}

/// Representative interactive element of a question container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub node: NodeId,
    pub widget: Widget,
    pub category: FieldCategory,
    /// Raw input type as reported in detection results ("email", "radio", ...)
    pub input_type: String,
}

/// One detected form question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionContainer {
    pub node: NodeId,
    pub label: Option<String>,
    pub inputs: Vec<NodeId>,
}
