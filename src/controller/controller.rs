use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    boundary::logger::{Logger, default_logger},
    controller::{
        observer::{MutationObserver, MutationSignal, ObserverConfig},
        page::{Page, PageType, detect_page_type},
        timer::DebounceTimer,
    },
    dom::document::Document,
    filler::{
        filler::{AutoFiller, FillerConfig},
        outcome::FillOutcome,
    },
    storage::{saved_data::load_saved_user_data, store::Store},
    trace::{logger::TraceLogger, trace::TraceEvent},
};

pub const NOTIFICATION_TITLE: &str = "FillEngine";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Debounce after a question container is injected
    #[serde(default = "default_question_delay")]
    pub question_delay_ms: u64,

    /// Debounce after other form elements show up
    #[serde(default = "default_form_element_delay")]
    pub form_element_delay_ms: u64,

    /// Delay at window load when radio/checkbox widgets need time to wire up
    #[serde(default = "default_interactive_load_delay")]
    pub interactive_load_delay_ms: u64,

    /// Delay at window load when no container exists yet
    #[serde(default = "default_empty_load_delay")]
    pub empty_load_delay_ms: u64,

    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,

    #[serde(default)]
    pub observer: ObserverConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            question_delay_ms: default_question_delay(),
            form_element_delay_ms: default_form_element_delay(),
            interactive_load_delay_ms: default_interactive_load_delay(),
            empty_load_delay_ms: default_empty_load_delay(),
            notification_ms: default_notification_ms(),
            observer: ObserverConfig::default(),
        }
    }
}

fn default_question_delay() -> u64 {
    500
}

fn default_form_element_delay() -> u64 {
    1500
}

fn default_interactive_load_delay() -> u64 {
    1500
}

fn default_empty_load_delay() -> u64 {
    2000
}

fn default_notification_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerState {
    Idle,
    Observing,
    FillScheduled,
    FillTriggered,
}

/// Transient "filled X/Y" toast shown after an unattended fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub shown_at_ms: u64,
    pub dismiss_at_ms: u64,
}

impl Notification {
    pub fn is_visible(&self, now_ms: u64) -> bool {
        self.shown_at_ms <= now_ms && now_ms < self.dismiss_at_ms
    }
}

// ============================================================================
// AutoFillController, one instance per page context
// ============================================================================

pub struct AutoFillController {
    page: Page,
    page_type: PageType,
    page_ready: bool,
    has_triggered: bool,

    observer: Option<MutationObserver>,
    timer: DebounceTimer,
    now_ms: u64,
    step: u64,

    filler: Option<AutoFiller>,
    store: Box<dyn Store>,
    logger: Arc<dyn Logger>,
    tracer: TraceLogger,
    config: ControllerConfig,

    notifications: Vec<Notification>,
    last_outcome: Option<FillOutcome>,
    fills_performed: usize,
}

impl AutoFillController {
    /// Without a logger, messages go through `tracing`.
    ///
    /// A filler that cannot be built leaves the controller running as a
    /// no-op: it still observes the page but never fills.
    pub fn new(
        page: Page,
        filler_config: &FillerConfig,
        config: ControllerConfig,
        store: Box<dyn Store>,
        logger: Option<Arc<dyn Logger>>,
    ) -> Self {
        let logger = logger.unwrap_or_else(default_logger);
        let filler = match AutoFiller::new(filler_config, logger.clone()) {
            Ok(f) => Some(f),
            Err(e) => {
                logger.error(&format!("AutoFiller init error: {}", e));
                None
            }
        };
        let page_type = page.page_type();
        logger.info(&format!("Auto-fill loaded for {:?} ({})", page_type, page.url));

        Self {
            page,
            page_type,
            page_ready: false,
            has_triggered: false,
            observer: None,
            timer: DebounceTimer::new(),
            now_ms: 0,
            step: 0,
            filler,
            store,
            logger,
            tracer: TraceLogger::disabled(),
            config,
            notifications: Vec::new(),
            last_outcome: None,
            fills_performed: 0,
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    // ---- Accessors ----

    pub fn state(&self) -> ControllerState {
        if self.has_triggered {
            ControllerState::FillTriggered
        } else if self.timer.is_pending() {
            ControllerState::FillScheduled
        } else if self.observer.is_some() {
            ControllerState::Observing
        } else {
            ControllerState::Idle
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.page.document
    }

    pub fn is_page_ready(&self) -> bool {
        self.page_ready
    }

    pub fn has_triggered(&self) -> bool {
        self.has_triggered
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_fill_due_ms(&self) -> Option<u64> {
        self.timer.due_at_ms()
    }

    pub fn filler(&self) -> Option<&AutoFiller> {
        self.filler.as_ref()
    }

    /// Filler and document borrowed together, for message handling.
    pub fn filler_and_document(&mut self) -> (Option<&mut AutoFiller>, &mut Document) {
        (self.filler.as_mut(), &mut self.page.document)
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        self.logger.clone()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn visible_notifications(&self) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| n.is_visible(self.now_ms))
            .collect()
    }

    pub fn last_outcome(&self) -> Option<&FillOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn fills_performed(&self) -> usize {
        self.fills_performed
    }

    // ---- Lifecycle ----

    /// Attach (or re-attach) the mutation observer. Records queued before
    /// attaching are not delivered.
    pub fn setup_observer(&mut self) {
        match MutationObserver::new(self.config.observer.clone()) {
            Ok(observer) => {
                self.page.document.take_mutations();
                self.observer = Some(observer);
                self.logger.info("Google Forms mutation observer initialized");
                self.trace(|e| e.with_decision("observe"));
            }
            Err(e) => self
                .logger
                .error(&format!("Could not set up mutation observer: {}", e)),
        }
    }

    pub fn dom_content_loaded(&mut self) {
        self.logger
            .info(&format!("DOM ready for {:?}", self.page_type));
        if self.page_type.qualifies() {
            self.setup_observer();
        }

        let containers = self.container_count();
        if containers > 0 {
            self.logger.info(&format!(
                "Early detection: {} containers at DOMContentLoaded",
                containers
            ));
            self.page_ready = true;
        } else {
            self.logger
                .debug("No containers at DOMContentLoaded, waiting for dynamic content");
        }
    }

    pub fn window_load(&mut self) {
        self.page_ready = true;
        if !self.page_type.qualifies() {
            return;
        }
        if self.observer.is_none() {
            self.setup_observer();
        }
        if self.has_triggered {
            return;
        }

        let has_containers = self.container_count() > 0;
        if !has_containers {
            self.logger
                .info("No containers at window load, relying on the observer");
            self.schedule_fill(self.config.empty_load_delay_ms);
        } else if self.has_choice_widgets() {
            self.logger
                .info("Interactive elements detected, using extended delay");
            self.schedule_fill(self.config.interactive_load_delay_ms);
        } else {
            self.trace(|e| e.with_decision("fill_now"));
            self.perform_auto_fill();
        }
    }

    /// Drain the document's mutation queue through the observer.
    pub fn process_mutations(&mut self) -> MutationSignal {
        let records = self.page.document.take_mutations();
        let Some(observer) = &self.observer else {
            return MutationSignal::None;
        };
        let signal = observer.classify(&self.page.document, &records);

        match signal {
            MutationSignal::None => {}
            _ if self.has_triggered => {
                self.trace(|e| e.with_signal(signal).with_suppression("already_triggered"));
            }
            MutationSignal::NewQuestion if self.page_ready => {
                self.logger
                    .info("New question detected, scheduling quick auto-fill");
                self.trace(|e| e.with_signal(signal).with_decision("debounce_short"));
                self.schedule_fill(self.config.question_delay_ms);
            }
            MutationSignal::NewQuestion | MutationSignal::FormElements => {
                self.logger
                    .debug("Form elements detected, scheduling potential auto-fill");
                self.trace(|e| e.with_signal(signal).with_decision("debounce_long"));
                self.schedule_fill(self.config.form_element_delay_ms);
            }
        }
        signal
    }

    /// Arm the single-slot timer, replacing any pending fill.
    pub fn schedule_fill(&mut self, delay_ms: u64) {
        if let Some(previous) = self.timer.schedule(self.now_ms, delay_ms) {
            self.logger.debug(&format!(
                "Cancelled pending fill due at {}ms",
                previous.due_at_ms()
            ));
        }
        self.trace(|e| e.with_decision("schedule").with_delay(delay_ms));
    }

    /// Move the virtual clock forward, firing the timer when it comes due.
    pub fn advance(&mut self, ms: u64) {
        let target = self.now_ms.saturating_add(ms);
        while let Some(due) = self.timer.due_at_ms().filter(|d| *d <= target) {
            self.now_ms = self.now_ms.max(due);
            if self.timer.fire_if_due(self.now_ms).is_some() {
                self.on_timer();
            }
        }
        self.now_ms = target;
    }

    fn on_timer(&mut self) {
        if self.page_type.qualifies() && self.page_ready && !self.has_triggered {
            self.logger.info("Triggering delayed auto-fill after DOM changes");
            self.perform_auto_fill();
        } else {
            self.trace(|e| e.with_decision("timer").with_suppression("not_eligible"));
        }
    }

    /// One unattended fill attempt. Returns the outcome when a pass ran.
    pub fn perform_auto_fill(&mut self) -> Option<FillOutcome> {
        if self.has_triggered {
            return None;
        }
        if !self.page_type.qualifies() {
            return None;
        }

        let profile = match load_saved_user_data(self.store.as_ref()) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                self.logger.debug("No saved auto-fill data available");
                self.trace(|e| e.with_decision("fill").with_suppression("no_saved_data"));
                return None;
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Could not read saved data: {}", e));
                return None;
            }
        };

        if self.container_count() == 0 {
            self.trace(|e| e.with_decision("fill").with_suppression("no_containers"));
            return None;
        }

        self.has_triggered = true;

        let Some(filler) = self.filler.as_mut() else {
            self.has_triggered = false;
            return None;
        };
        filler.update_user_profile(profile);
        let outcome = filler.fill_form(&mut self.page.document);
        self.fills_performed += 1;

        if outcome.success {
            self.notify(outcome.fields_filled, outcome.fields_detected);
        } else {
            // Leave the door open for a later attempt.
            self.has_triggered = false;
        }

        let (filled, fingerprint) = (outcome.fields_filled, outcome.form_fingerprint.clone());
        self.trace(|e| e.with_decision("fill").with_fill(filled, fingerprint.as_deref()));
        self.last_outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Single-page-app history change.
    pub fn navigate(&mut self, url: &str) {
        self.logger
            .info("Navigation detected, resetting auto-fill state");
        self.page.url = url.to_string();
        self.has_triggered = false;

        let new_type = detect_page_type(url);
        if new_type != self.page_type {
            self.page_type = new_type;
            self.logger
                .info(&format!("Page type changed to {:?}", new_type));
            if new_type.qualifies() {
                self.setup_observer();
            } else {
                self.dispose();
            }
        }
        self.trace(|e| e.with_decision("navigate"));
    }

    /// Unload cleanup: drop observer and timer, reset flags.
    pub fn dispose(&mut self) {
        if self.observer.take().is_some() {
            self.logger.info("Mutation observer cleaned up");
        }
        if self.timer.cancel().is_some() {
            self.logger.info("Pending auto-fill cleared");
        }
        self.page_ready = false;
        self.has_triggered = false;
        self.trace(|e| e.with_decision("dispose"));
    }

    /// Trace events that have reached the trace file so far.
    pub fn trace_events_written(&self) -> usize {
        self.tracer.events_written()
    }

    // ---- Helpers ----

    fn container_count(&self) -> usize {
        self.filler.as_ref().map_or(0, |f| {
            f.detector()
                .find_question_containers(&self.page.document)
                .len()
        })
    }

    fn has_choice_widgets(&self) -> bool {
        let Some(filler) = &self.filler else {
            return false;
        };
        let detector = filler.detector();
        detector
            .find_question_containers(&self.page.document)
            .iter()
            .any(|c| detector.has_choice_widgets(&self.page.document, c.node))
    }

    fn notify(&mut self, filled: usize, total: usize) {
        let notification = Notification {
            title: NOTIFICATION_TITLE.to_string(),
            message: format!("Rempli {}/{} champs automatiquement", filled, total),
            shown_at_ms: self.now_ms,
            dismiss_at_ms: self.now_ms.saturating_add(self.config.notification_ms),
        };
        self.logger.info(&notification.message);
        self.notifications.push(notification);
    }

    fn trace(&mut self, build: impl FnOnce(TraceEvent) -> TraceEvent) {
        if !self.tracer.is_enabled() {
            return;
        }
        let event = build(TraceEvent::now(self.step, self.now_ms, self.state()));
        self.step += 1;
        self.tracer.log(&event);
    }
}
