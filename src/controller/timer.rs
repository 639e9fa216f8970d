/// A fill waiting on the debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFill {
    pub scheduled_at_ms: u64,
    pub delay_ms: u64,
}

impl PendingFill {
    pub fn due_at_ms(&self) -> u64 {
        self.scheduled_at_ms.saturating_add(self.delay_ms)
    }
}

/// Single-slot debounce timer on the controller's virtual clock.
///
/// Scheduling always replaces whatever was pending, so a burst of
/// triggers collapses into one firing at the last requested deadline.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    pending: Option<PendingFill>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer; returns the fill it displaced, if any.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64) -> Option<PendingFill> {
        self.pending.replace(PendingFill {
            scheduled_at_ms: now_ms,
            delay_ms,
        })
    }

    pub fn cancel(&mut self) -> Option<PendingFill> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<PendingFill> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at_ms(&self) -> Option<u64> {
        self.pending.map(|p| p.due_at_ms())
    }

    /// Disarm and return the pending fill when its deadline has passed.
    pub fn fire_if_due(&mut self, now_ms: u64) -> Option<PendingFill> {
        match self.pending {
            Some(p) if p.due_at_ms() <= now_ms => self.pending.take(),
            _ => None,
        }
    }
}
