use crate::controller::scenario::{Expectation, ScenarioResult};
use crate::filler::outcome::{DetectionResult, FieldStatus, FillOutcome};

// ============================================================================
// Console reporter
// ============================================================================

/// Format one fill pass for terminal output.
///
/// Produces output like:
/// ```text
/// === Fill pass: 2/3 fields filled ===
///
/// ✓ FILLED     Email address        email = a@b.com
/// · UNMATCHED  Favorite color       (text)
///
/// === Results: 2 filled, 0 errors, 0 skipped ===
/// ```
pub fn format_fill_report(outcome: &FillOutcome, results: &[DetectionResult]) -> String {
    let mut out = String::new();

    if !outcome.success {
        out.push_str(&format!(
            "=== Fill pass failed: {} ===\n",
            outcome.message.as_deref().unwrap_or("unknown error")
        ));
        return out;
    }

    out.push_str(&format!(
        "=== Fill pass: {}/{} fields filled ===\n\n",
        outcome.fields_filled, outcome.fields_detected
    ));

    let width = results
        .iter()
        .map(|r| r.question_label.chars().count())
        .max()
        .unwrap_or(0);

    for result in results {
        let detail = match (&result.status, &result.value) {
            (FieldStatus::Unmatched | FieldStatus::NoInput, _) => {
                format!("({})", result.input_type)
            }
            (_, Some(value)) => format!("{} = {}", result.key, value),
            (_, None) => result.key.clone(),
        };
        out.push_str(&format!(
            "{}  {:<width$}  {}\n",
            status_marker(result.status),
            result.question_label,
            detail,
            width = width
        ));
    }

    for error in &outcome.errors {
        out.push_str(&format!("    [ERROR] {}: {}\n", error.question_label, error.message));
    }

    out.push_str(&format!(
        "\n=== Results: {} filled, {} errors, {} skipped",
        outcome.fields_filled,
        outcome.errors.len(),
        outcome.fields_skipped
    ));
    if let Some(fp) = &outcome.form_fingerprint {
        out.push_str(&format!(" (form {})", &fp[..fp.len().min(12)]));
    }
    out.push_str(" ===\n");

    out
}

fn status_marker(status: FieldStatus) -> &'static str {
    match status {
        FieldStatus::Filled => "\u{2713} FILLED   ",
        FieldStatus::Unmatched => "\u{b7} UNMATCHED",
        FieldStatus::NoInput => "\u{b7} NO INPUT ",
        FieldStatus::Flagged => "! FLAGGED  ",
        FieldStatus::Failed => "\u{2717} FAILED   ",
    }
}

/// Format replayed scenarios, one line each plus failed checks.
pub fn format_scenario_report(results: &[ScenarioResult]) -> String {
    let mut out = String::new();
    let passed = results.iter().filter(|r| r.passed).count();

    for result in results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        out.push_str(&format!(
            "{}  {} ({} steps, {} fills)\n",
            marker, result.name, result.steps_run, result.fills_performed
        ));

        if let Some(ref error) = result.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }
        for check in result.checks.iter().filter(|c| !c.passed) {
            out.push_str(&format!(
                "    [FAIL] Step {}: {}, actual {}\n",
                check.step_index,
                format_check(&check.check),
                check.actual
            ));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total) ===\n",
        passed,
        results.len() - passed,
        results.len()
    ));
    out
}

fn format_check(check: &Expectation) -> String {
    match check {
        Expectation::FillsPerformed { expected } => format!("FillsPerformed == {}", expected),
        Expectation::HasTriggered { expected } => format!("HasTriggered == {}", expected),
        Expectation::State { expected } => format!("State == {}", expected),
        Expectation::FieldValue { selector, expected } => {
            format!("FieldValue({}) == \"{}\"", selector, expected)
        }
        Expectation::Checked { selector, expected } => {
            format!("Checked({}) == {}", selector, expected)
        }
        Expectation::NotificationVisible { expected } => {
            format!("NotificationVisible == {}", expected)
        }
        Expectation::FieldsFilled { expected } => format!("FieldsFilled == {}", expected),
    }
}
