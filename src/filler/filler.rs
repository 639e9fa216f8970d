use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    boundary::{error_boundary::ErrorBoundary, logger::Logger},
    detect::{
        detector::{DetectorConfig, FormDetector},
        field_model::FieldCategory,
        label::form_fingerprint,
    },
    dom::document::Document,
    filler::{
        error::FillError,
        highlight::{self, DEFAULT_HIGHLIGHT_CLASS},
        outcome::{
            DetectionResult, FieldError, FieldStatus, FillOutcome, FillStatistics, HighlightResult,
            RemoveHighlightsResult,
        },
        strategy::{self, Applied},
    },
    mapping::{matcher::match_label, profile::UserProfile, table::FieldMappingTable},
};

const NO_PROFILE: &str = "No profile data loaded";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerConfig {
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Extra label keywords per field key
    #[serde(default)]
    pub extra_keywords: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_highlight_class")]
    pub highlight_class: String,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            extra_keywords: BTreeMap::new(),
            highlight_class: default_highlight_class(),
        }
    }
}

fn default_highlight_class() -> String {
    DEFAULT_HIGHLIGHT_CLASS.to_string()
}

// ============================================================================
// AutoFiller: detection, matching and fill orchestration
// ============================================================================

pub struct AutoFiller {
    detector: FormDetector,
    table: FieldMappingTable,
    profile: UserProfile,
    statistics: FillStatistics,
    boundary: ErrorBoundary,
    logger: Arc<dyn Logger>,
    highlight_class: String,
}

impl AutoFiller {
    pub fn new(config: &FillerConfig, logger: Arc<dyn Logger>) -> Result<Self, FillError> {
        let detector = FormDetector::new(&config.detector)
            .map_err(|e| FillError::Init(format!("detector: {}", e)))?;
        let table = FieldMappingTable::with_extra_keywords(&config.extra_keywords)
            .map_err(|e| FillError::Init(format!("field mappings: {}", e)))?;

        Ok(Self {
            detector,
            table,
            profile: UserProfile::new(),
            statistics: FillStatistics::default(),
            boundary: ErrorBoundary::new(logger.clone()),
            logger,
            highlight_class: config.highlight_class.clone(),
        })
    }

    /// Replace the whole profile; the next pass sees only the new data.
    pub fn update_user_profile(&mut self, profile: UserProfile) {
        self.logger
            .debug(&format!("Profile updated ({} entries)", profile.len()));
        self.profile = profile;
    }

    pub fn get_user_profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn get_field_mappings(&self) -> &FieldMappingTable {
        &self.table
    }

    pub fn detector(&self) -> &FormDetector {
        &self.detector
    }

    pub fn statistics(&self) -> &FillStatistics {
        &self.statistics
    }

    /// Run one detection + fill pass over the document.
    ///
    /// A failing field is recorded in `errors` and the pass moves on. Without
    /// profile data every container is still recorded, as unmatched, and the
    /// pass reports failure.
    pub fn fill_form(&mut self, doc: &mut Document) -> FillOutcome {
        self.statistics.detection_results.clear();
        self.statistics.passes += 1;

        let containers = self.detector.find_question_containers(doc);
        if containers.is_empty() {
            return FillOutcome::failure(if self.profile.is_empty() {
                NO_PROFILE
            } else {
                "No form questions detected"
            });
        }

        let mut outcome = FillOutcome {
            success: true,
            ..FillOutcome::default()
        };
        let mut seen = HashSet::new();
        let mut labels = Vec::new();

        for (index, container) in containers.iter().enumerate() {
            let question_label = container
                .label
                .clone()
                .unwrap_or_else(|| format!("Question {}", index + 1));

            if !seen.insert(question_label.to_lowercase()) {
                self.logger
                    .debug(&format!("Skipping duplicate question '{}'", question_label));
                outcome.fields_skipped += 1;
                continue;
            }
            labels.push(question_label.clone());

            let input = container
                .label
                .as_ref()
                .and_then(|_| self.detector.find_input_field(doc, container.node));
            let matched = container
                .label
                .as_ref()
                .and_then(|l| match_label(l, &self.profile, &self.table));

            let mut result = DetectionResult {
                question_label: question_label.clone(),
                matched: matched.is_some(),
                key: matched
                    .as_ref()
                    .map(|m| m.key.clone())
                    .unwrap_or_else(|| {
                        input
                            .as_ref()
                            .map_or(FieldCategory::Other, |i| i.category)
                            .as_str()
                            .to_string()
                    }),
                value: matched.as_ref().map(|m| m.value.display()),
                input_type: input
                    .as_ref()
                    .map_or_else(|| "none".to_string(), |i| i.input_type.clone()),
                field_category: input.as_ref().map_or(FieldCategory::Other, |i| i.category),
                has_input_field: input.is_some(),
                filled: false,
                status: FieldStatus::Unmatched,
                container: container.node,
            };

            match (&input, &matched) {
                (None, _) => result.status = FieldStatus::NoInput,
                (Some(_), None) => result.status = FieldStatus::Unmatched,
                (Some(field), Some(m)) => {
                    match strategy::apply(doc, field, container.node, &question_label, &m.value, &self.boundary) {
                        Ok(Applied::Filled) => {
                            result.filled = true;
                            result.status = FieldStatus::Filled;
                            outcome.fields_filled += 1;
                        }
                        Ok(Applied::Flagged) => {
                            result.status = FieldStatus::Flagged;
                            self.logger.info(&format!(
                                "File upload field '{}' flagged for manual completion",
                                question_label
                            ));
                        }
                        Err(e) => {
                            self.logger
                                .warn(&format!("Failed to fill '{}': {}", question_label, e));
                            result.status = FieldStatus::Failed;
                            outcome.errors.push(FieldError {
                                question_label: question_label.clone(),
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }

            self.statistics.detection_results.push(result);
        }

        outcome.fields_detected = self.statistics.detection_results.len();
        outcome.form_fingerprint = Some(form_fingerprint(&labels));

        if self.profile.is_empty() {
            self.logger.warn(&format!(
                "{}: {} questions left unmatched",
                NO_PROFILE, outcome.fields_detected
            ));
            outcome.success = false;
            outcome.message = Some(NO_PROFILE.to_string());
            return outcome;
        }

        self.logger.info(&format!(
            "Fill pass complete: {}/{} fields filled, {} errors",
            outcome.fields_filled,
            outcome.fields_detected,
            outcome.errors.len()
        ));
        outcome
    }

    /// Highlight containers of the last pass that still need the user.
    pub fn highlight_unfilled_fields(&self, doc: &mut Document) -> HighlightResult {
        match highlight::highlight_unfilled(doc, &self.statistics.detection_results, &self.highlight_class) {
            Ok(result) => result,
            Err(e) => {
                self.logger.error(&format!("Highlighting failed: {}", e));
                HighlightResult {
                    success: false,
                    highlighted_count: 0,
                }
            }
        }
    }

    pub fn remove_highlights(&self, doc: &mut Document) -> RemoveHighlightsResult {
        match highlight::remove_highlights(doc, &self.highlight_class) {
            Ok(result) => result,
            Err(e) => {
                self.logger.error(&format!("Removing highlights failed: {}", e));
                RemoveHighlightsResult {
                    success: false,
                    removed_count: 0,
                }
            }
        }
    }
}
