use std::fmt;

use crate::dom::error::DomError;

#[derive(Debug)]
pub enum FillError {
    /// DOM operation or page script failure not attributable to foreign noise
    Dom(DomError),

    /// Control is disabled and cannot take a value
    Disabled { label: String },

    /// Control is read-only
    ReadOnly { label: String },

    /// No option of a choice widget matches the profile value
    OptionNotFound { label: String, value: String },

    /// Profile value cannot be turned into a date
    InvalidDate { label: String, value: String },

    /// Filler could not be constructed (bad selector or keyword config)
    Init(String),
}

impl fmt::Display for FillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillError::Dom(e) => write!(f, "{}", e),
            FillError::Disabled { label } => write!(f, "Field '{}' is disabled", label),
            FillError::ReadOnly { label } => write!(f, "Field '{}' is read-only", label),
            FillError::OptionNotFound { label, value } => {
                write!(f, "No option matching '{}' in field '{}'", value, label)
            }
            FillError::InvalidDate { label, value } => {
                write!(f, "Value '{}' for field '{}' is not a recognizable date", value, label)
            }
            FillError::Init(msg) => write!(f, "Auto filler initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for FillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FillError::Dom(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DomError> for FillError {
    fn from(e: DomError) -> Self {
        FillError::Dom(e)
    }
}
