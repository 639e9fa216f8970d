use form_autofill::controller::scenario::{CheckResult, Expectation, ScenarioResult};
use form_autofill::detect::field_model::FieldCategory;
use form_autofill::dom::document::NodeId;
use form_autofill::filler::outcome::{
    DetectionResult, FieldError, FieldStatus, FillOutcome,
};
use form_autofill::report::console::{format_fill_report, format_scenario_report};

// ============================================================================
// Helper builders
// ============================================================================

fn result(label: &str, status: FieldStatus, key: &str, value: Option<&str>) -> DetectionResult {
    DetectionResult {
        question_label: label.to_string(),
        matched: value.is_some(),
        key: key.to_string(),
        value: value.map(str::to_string),
        input_type: "text".to_string(),
        field_category: FieldCategory::Text,
        has_input_field: status != FieldStatus::NoInput,
        filled: status == FieldStatus::Filled,
        status,
        container: NodeId(0),
    }
}

fn scenario(name: &str, passed: bool) -> ScenarioResult {
    ScenarioResult {
        name: name.to_string(),
        passed,
        steps_run: 4,
        fills_performed: 1,
        checks: vec![CheckResult {
            step_index: 3,
            check: Expectation::FieldsFilled { expected: 2 },
            passed,
            actual: if passed { "2" } else { "1" }.to_string(),
        }],
        responses: vec![],
        error: None,
    }
}

// ============================================================================
// Fill report
// ============================================================================

#[test]
fn fill_report_lists_every_question() {
    let outcome = FillOutcome {
        success: true,
        fields_filled: 1,
        fields_detected: 3,
        fields_skipped: 1,
        errors: vec![FieldError {
            question_label: "Phone".into(),
            message: "Field 'Phone' is disabled".into(),
        }],
        form_fingerprint: Some("0123456789abcdef0123456789abcdef01234567".into()),
        message: None,
    };
    let results = vec![
        result("Email address", FieldStatus::Filled, "email", Some("a@b.com")),
        result("Favorite color", FieldStatus::Unmatched, "text", None),
        result("Phone", FieldStatus::Failed, "phone", Some("0601")),
    ];

    let report = format_fill_report(&outcome, &results);

    assert!(report.starts_with("=== Fill pass: 1/3 fields filled ==="));
    assert!(report.contains("\u{2713} FILLED"));
    assert!(report.contains("email = a@b.com"));
    assert!(report.contains("Favorite color  (text)"));
    assert!(report.contains("\u{2717} FAILED"));
    assert!(report.contains("[ERROR] Phone: Field 'Phone' is disabled"));
    assert!(report.contains("1 filled, 1 errors, 1 skipped (form 0123456789ab) ==="));
}

#[test]
fn failed_pass_report_is_one_line() {
    let report = format_fill_report(&FillOutcome::failure("No profile data loaded"), &[]);
    assert_eq!(report, "=== Fill pass failed: No profile data loaded ===\n");
}

// ============================================================================
// Scenario report
// ============================================================================

#[test]
fn scenario_report_counts_and_failures() {
    let report = format_scenario_report(&[scenario("late", true), scenario("early", false)]);

    assert!(report.contains("\u{2713} PASS  late (4 steps, 1 fills)"));
    assert!(report.contains("\u{2717} FAIL  early"));
    assert!(report.contains("[FAIL] Step 3: FieldsFilled == 2, actual 1"));
    assert!(report.contains("=== Results: 1 passed, 1 failed (2 total) ==="));
}

#[test]
fn scenario_error_is_reported() {
    let mut broken = scenario("broken", false);
    broken.checks.clear();
    broken.error = Some("Step 1 failed: No element matches '#x'".into());
    let report = format_scenario_report(&[broken]);
    assert!(report.contains("[ERROR] Step 1 failed: No element matches '#x'"));
}
