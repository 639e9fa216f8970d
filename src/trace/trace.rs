use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::controller::{controller::ControllerState, observer::MutationSignal};

/// One controller decision, written as a JSONL line.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    /// Virtual page clock when the decision was taken.
    pub clock_ms: u64,
    pub step: u64,

    pub controller_state: String,

    pub signal: Option<String>,

    pub decision: Option<String>,
    pub delay_ms: Option<u64>,
    pub fields_filled: Option<usize>,
    pub form_fingerprint: Option<String>,

    pub suppression_reason: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, clock_ms: u64, state: ControllerState) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            clock_ms,
            step,
            controller_state: format!("{:?}", state),
            signal: None,
            decision: None,
            delay_ms: None,
            fields_filled: None,
            form_fingerprint: None,
            suppression_reason: None,
        }
    }

    pub fn with_signal(mut self, signal: MutationSignal) -> Self {
        self.signal = Some(format!("{:?}", signal));
        self
    }

    pub fn with_decision(mut self, decision: impl ToString) -> Self {
        self.decision = Some(decision.to_string());
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_fill(mut self, fields_filled: usize, fingerprint: Option<&str>) -> Self {
        self.fields_filled = Some(fields_filled);
        self.form_fingerprint = fingerprint.map(str::to_string);
        self
    }

    pub fn with_suppression(mut self, reason: impl ToString) -> Self {
        self.suppression_reason = Some(reason.to_string());
        self
    }
}
