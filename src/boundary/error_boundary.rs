use std::sync::Arc;

use crate::{boundary::logger::Logger, dom::error::DomError};

/// Script names of co-installed extensions known to throw into our events.
pub const FOREIGN_SCRIPT_MARKERS: &[&str] = &["contentScript.js", "content-script"];

/// Messages known to come from unrelated page scripts.
pub const NOISE_PATTERNS: &[&str] = &["sentence", "Cannot read properties of undefined"];

/// Prefix carried by our own diagnostics.
pub const OWN_MARKER: &str = "[AutoFill]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorOrigin {
    Own,
    Foreign { reason: String },
}

/// Attribute an error to us or to a foreign script by its source/stack
/// and message text.
pub fn classify_origin(message: &str, source: &str) -> ErrorOrigin {
    if message.contains(OWN_MARKER) {
        return ErrorOrigin::Own;
    }
    if let Some(marker) = FOREIGN_SCRIPT_MARKERS.iter().find(|m| source.contains(*m)) {
        return ErrorOrigin::Foreign {
            reason: format!("source contains '{}'", marker),
        };
    }
    if let Some(pattern) = NOISE_PATTERNS.iter().find(|p| message.contains(*p)) {
        return ErrorOrigin::Foreign {
            reason: format!("message matches '{}'", pattern),
        };
    }
    ErrorOrigin::Own
}

/// Filter applied around our own entry points (message handling, fill
/// passes). Foreign noise is logged and dropped; everything else passes.
#[derive(Clone)]
pub struct ErrorBoundary {
    logger: Arc<dyn Logger>,
}

impl ErrorBoundary {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// `Ok(())` when the error was foreign noise and has been suppressed.
    pub fn filter(&self, error: DomError) -> Result<(), DomError> {
        let origin = match &error {
            DomError::Script { message, source } => classify_origin(message, source),
            _ => ErrorOrigin::Own,
        };
        match origin {
            ErrorOrigin::Foreign { reason } => {
                self.logger.warn(&format!(
                    "{} Suppressed external script error ({}): {}",
                    OWN_MARKER, reason, error
                ));
                Ok(())
            }
            ErrorOrigin::Own => Err(error),
        }
    }
}
