use std::sync::{Arc, Mutex};

/// Logging capability handed to the controller and filler.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default logger: forwards to `tracing` under the `autofill` target.
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "autofill", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "autofill", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "autofill", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "autofill", "{}", message);
    }
}

pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Collects log lines in memory; used by tests and the replay command.
#[derive(Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: LogLevel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, l)| l.contains(needle))
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lines().iter().filter(|(lv, _)| *lv == level).count()
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}
