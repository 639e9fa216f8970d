use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    boundary::logger::Logger,
    controller::{
        controller::{AutoFillController, ControllerConfig, ControllerState},
        page::Page,
    },
    dom::{
        document::NodeId,
        error::DomError,
        snapshot::{NodeSnapshot, PageSnapshot},
    },
    filler::filler::FillerConfig,
    messaging::{handler::MessageHandler, protocol::Response},
    storage::store::MemoryStore,
    trace::logger::TraceLogger,
};

/// A scripted page lifetime: initial page, stored data and the events
/// that happen to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,

    pub page: PageSnapshot,

    /// Initial extension storage contents
    #[serde(default)]
    pub storage: BTreeMap<String, Value>,

    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum ScenarioStep {
    DomContentLoaded,
    WindowLoad,

    /// Append a node under the first element matching `parent`
    Append { parent: String, node: NodeSnapshot },

    /// Remove the first element matching `target`
    Remove { target: String },

    SetAttribute {
        target: String,
        name: String,
        value: String,
    },

    /// Let virtual time pass
    Advance { ms: u64 },

    Navigate { url: String },

    /// Deliver a runtime message; the reply is kept in the result
    Message { request: Value },

    Dispose,

    Expect { checks: Vec<Expectation> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    FillsPerformed { expected: usize },
    HasTriggered { expected: bool },
    State { expected: String },
    FieldValue { selector: String, expected: String },
    Checked { selector: String, expected: bool },
    NotificationVisible { expected: bool },
    FieldsFilled { expected: usize },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckResult {
    pub step_index: usize,
    pub check: Expectation,
    pub passed: bool,
    pub actual: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub fills_performed: usize,
    pub checks: Vec<CheckResult>,
    pub responses: Vec<Response>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum ScenarioError {
    NoMatch { selector: String },
    Dom(DomError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::NoMatch { selector } => {
                write!(f, "No element matches '{}'", selector)
            }
            ScenarioError::Dom(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::Dom(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DomError> for ScenarioError {
    fn from(e: DomError) -> Self {
        ScenarioError::Dom(e)
    }
}

/// Drives a `Scenario` through a fresh controller.
pub struct ScenarioRunner {
    pub filler_config: FillerConfig,
    pub controller_config: ControllerConfig,
    pub logger: Option<Arc<dyn Logger>>,
    pub trace_path: Option<String>,
}

impl ScenarioRunner {
    pub fn new(filler_config: FillerConfig, controller_config: ControllerConfig) -> Self {
        Self {
            filler_config,
            controller_config,
            logger: None,
            trace_path: None,
        }
    }

    pub fn build_controller(&self, scenario: &Scenario) -> AutoFillController {
        let store = scenario
            .storage
            .iter()
            .fold(MemoryStore::new(), |s, (k, v)| s.with(k, v.clone()));
        let controller = AutoFillController::new(
            Page::from_snapshot(&scenario.page),
            &self.filler_config,
            self.controller_config.clone(),
            Box::new(store),
            self.logger.clone(),
        );
        match &self.trace_path {
            Some(path) => controller.with_tracer(TraceLogger::new(path)),
            None => controller,
        }
    }

    pub fn run(&self, scenario: &Scenario) -> ScenarioResult {
        let mut controller = self.build_controller(scenario);
        self.run_with(scenario, &mut controller)
    }

    pub fn run_with(&self, scenario: &Scenario, controller: &mut AutoFillController) -> ScenarioResult {
        let mut checks = Vec::new();
        let mut responses = Vec::new();

        for (i, step) in scenario.steps.iter().enumerate() {
            if let Err(e) = Self::execute_step(step, i, controller, &mut checks, &mut responses) {
                return ScenarioResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: i + 1,
                    fills_performed: controller.fills_performed(),
                    checks,
                    responses,
                    error: Some(format!("Step {} failed: {}", i, e)),
                };
            }
        }

        ScenarioResult {
            name: scenario.name.clone(),
            passed: checks.iter().all(|c| c.passed),
            steps_run: scenario.steps.len(),
            fills_performed: controller.fills_performed(),
            checks,
            responses,
            error: None,
        }
    }

    fn execute_step(
        step: &ScenarioStep,
        step_index: usize,
        controller: &mut AutoFillController,
        checks: &mut Vec<CheckResult>,
        responses: &mut Vec<Response>,
    ) -> Result<(), ScenarioError> {
        match step {
            ScenarioStep::DomContentLoaded => controller.dom_content_loaded(),
            ScenarioStep::WindowLoad => controller.window_load(),

            ScenarioStep::Append { parent, node } => {
                let target = Self::resolve(controller, parent)?;
                controller.document_mut().append_subtree(target, node)?;
                controller.process_mutations();
            }

            ScenarioStep::Remove { target } => {
                let node = Self::resolve(controller, target)?;
                controller.document_mut().remove(node)?;
                controller.process_mutations();
            }

            ScenarioStep::SetAttribute { target, name, value } => {
                let node = Self::resolve(controller, target)?;
                controller.document_mut().set_attribute(node, name, value)?;
                controller.process_mutations();
            }

            ScenarioStep::Advance { ms } => controller.advance(*ms),
            ScenarioStep::Navigate { url } => controller.navigate(url),

            ScenarioStep::Message { request } => {
                responses.push(MessageHandler::handle_value(controller, request.clone()));
            }

            ScenarioStep::Dispose => controller.dispose(),

            ScenarioStep::Expect { checks: expected } => {
                for check in expected {
                    checks.push(Self::evaluate(check, step_index, controller)?);
                }
            }
        }
        Ok(())
    }

    fn resolve(
        controller: &AutoFillController,
        selector: &str,
    ) -> Result<NodeId, ScenarioError> {
        let doc = &controller.page().document;
        doc.query(doc.root(), selector)?
            .ok_or_else(|| ScenarioError::NoMatch {
                selector: selector.to_string(),
            })
    }

    fn evaluate(
        check: &Expectation,
        step_index: usize,
        controller: &AutoFillController,
    ) -> Result<CheckResult, ScenarioError> {
        let (passed, actual) = match check {
            Expectation::FillsPerformed { expected } => {
                let actual = controller.fills_performed();
                (actual == *expected, actual.to_string())
            }
            Expectation::HasTriggered { expected } => {
                let actual = controller.has_triggered();
                (actual == *expected, actual.to_string())
            }
            Expectation::State { expected } => {
                let actual = state_name(controller.state());
                (actual.eq_ignore_ascii_case(expected), actual.to_string())
            }
            Expectation::FieldValue { selector, expected } => {
                let node = Self::resolve(controller, selector)?;
                let actual = controller
                    .page()
                    .document
                    .value(node)
                    .unwrap_or_default()
                    .to_string();
                (actual == *expected, actual)
            }
            Expectation::Checked { selector, expected } => {
                let node = Self::resolve(controller, selector)?;
                let actual = controller.page().document.is_checked(node);
                (actual == *expected, actual.to_string())
            }
            Expectation::NotificationVisible { expected } => {
                let actual = !controller.visible_notifications().is_empty();
                (actual == *expected, actual.to_string())
            }
            Expectation::FieldsFilled { expected } => {
                let actual = controller.last_outcome().map_or(0, |o| o.fields_filled);
                (actual == *expected, actual.to_string())
            }
        };
        Ok(CheckResult {
            step_index,
            check: check.clone(),
            passed,
            actual,
        })
    }
}

fn state_name(state: ControllerState) -> &'static str {
    match state {
        ControllerState::Idle => "idle",
        ControllerState::Observing => "observing",
        ControllerState::FillScheduled => "fill-scheduled",
        ControllerState::FillTriggered => "fill-triggered",
    }
}
