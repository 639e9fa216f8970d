use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
};

use crate::trace::trace::TraceEvent;

/// Decisions that close a controller cycle; the buffer is flushed after them.
const FLUSH_DECISIONS: &[&str] = &["fill", "navigate", "dispose"];

/// Buffers controller decisions as JSONL lines.
///
/// Lines reach the file once a cycle closes (a fill attempt, a navigation,
/// a dispose), on an explicit [`flush`](Self::flush), and on drop. An
/// unopenable file disables tracing instead of failing the page.
pub struct TraceLogger {
    writer: Option<BufWriter<File>>,
    buffered: usize,
    written: usize,
}

impl TraceLogger {
    pub fn disabled() -> Self {
        Self {
            writer: None,
            buffered: 0,
            written: 0,
        }
    }

    pub fn new(path: &str) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Self {
                writer: Some(BufWriter::new(f)),
                buffered: 0,
                written: 0,
            },
            Err(e) => {
                tracing::warn!(path, error = %e, "could not open trace file");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Events that have reached the file.
    pub fn events_written(&self) -> usize {
        self.written
    }

    pub fn log(&mut self, event: &TraceEvent) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize trace event");
                return;
            }
        };

        if let Err(e) = writeln!(writer, "{}", json) {
            tracing::warn!(error = %e, "failed to write trace event");
            return;
        }
        self.buffered += 1;

        if event
            .decision
            .as_deref()
            .is_some_and(|d| FLUSH_DECISIONS.contains(&d))
        {
            self.flush();
        }
    }

    pub fn flush(&mut self) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        match writer.flush() {
            Ok(()) => {
                self.written += self.buffered;
                self.buffered = 0;
            }
            Err(e) => {
                tracing::warn!(error = %e, pending = self.buffered, "failed to flush trace file");
            }
        }
    }
}

impl Drop for TraceLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::controller::ControllerState;

    fn temp_path(name: &str) -> String {
        let path = std::env::temp_dir().join(format!("form-autofill-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_file(&path);
        path.to_string_lossy().to_string()
    }

    fn lines(path: &str) -> usize {
        std::fs::read_to_string(path).unwrap_or_default().lines().count()
    }

    #[test]
    fn decisions_are_buffered_until_a_cycle_closes() {
        let path = temp_path("trace-buffer.jsonl");
        let mut tracer = TraceLogger::new(&path);

        tracer.log(&TraceEvent::now(0, 0, ControllerState::Observing).with_decision("observe"));
        tracer.log(&TraceEvent::now(1, 10, ControllerState::FillScheduled).with_decision("schedule"));
        assert_eq!(tracer.events_written(), 0);

        tracer.log(&TraceEvent::now(2, 510, ControllerState::FillTriggered).with_decision("fill"));
        assert_eq!(tracer.events_written(), 3);
        assert_eq!(lines(&path), 3);
    }

    #[test]
    fn drop_flushes_the_tail() {
        let path = temp_path("trace-drop.jsonl");
        {
            let mut tracer = TraceLogger::new(&path);
            tracer.log(&TraceEvent::now(0, 0, ControllerState::Observing).with_decision("observe"));
        }
        assert_eq!(lines(&path), 1);
    }

    #[test]
    fn unopenable_path_disables_tracing() {
        let dir = std::env::temp_dir();
        let mut tracer = TraceLogger::new(&dir.to_string_lossy());
        assert!(!tracer.is_enabled());
        tracer.log(&TraceEvent::now(0, 0, ControllerState::Idle).with_decision("fill"));
        assert_eq!(tracer.events_written(), 0);
    }
}
