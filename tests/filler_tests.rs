use std::sync::Arc;

use form_autofill::{
    boundary::logger::LogLevel,
    dom::{
        document::{Document, EventKind},
        snapshot::{NodeSnapshot, PageSnapshot},
    },
    filler::{
        filler::{AutoFiller, FillerConfig},
        highlight::DEFAULT_HIGHLIGHT_CLASS,
        outcome::FieldStatus,
    },
    mapping::profile::{ProfileValue, UserProfile},
};
use serde_json::Value;

use crate::common::{
    fixtures::{
        ann_profile, checkbox_question, contact_questions, container_of, document,
        filler, filler_with, input_of, listbox_question, memory_logger, option_node, question,
        radio_question, select_question, text_input, text_question,
    },
    utils::read_fixture,
};

mod common;

fn highlighted(doc: &Document) -> usize {
    doc.query_all(doc.body(), &format!(".{}", DEFAULT_HIGHLIGHT_CLASS))
        .unwrap()
        .len()
}

fn fixture_page() -> (Document, UserProfile) {
    let page = PageSnapshot::from_json(&read_fixture("contact_form.json")).unwrap();
    let raw: Value = serde_json::from_str(&read_fixture("profile.json")).unwrap();
    (
        Document::from_snapshot(&page.body),
        UserProfile::from_json(&raw).unwrap(),
    )
}

// =========================================================================
// Fill pass
// =========================================================================

#[test]
fn two_of_three_known_labels_are_filled() {
    let mut doc = document(contact_questions());
    let mut filler = filler_with(ann_profile());

    let outcome = filler.fill_form(&mut doc);

    assert!(outcome.success);
    assert_eq!(outcome.fields_detected, 3);
    assert_eq!(outcome.fields_filled, 2);
    assert!(outcome.errors.is_empty());

    let results = &filler.statistics().detection_results;
    let unmatched: Vec<_> = results.iter().filter(|r| !r.matched).collect();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].question_label, "Favorite color");
    assert_eq!(unmatched[0].status, FieldStatus::Unmatched);

    assert_eq!(doc.value(input_of(&doc, "Email address")), Some("a@b.com"));
    assert_eq!(doc.value(input_of(&doc, "First Name")), Some("Ann"));
    assert_eq!(doc.value(input_of(&doc, "Favorite color")), Some(""));
}

#[test]
fn text_fill_dispatches_native_event_sequence() {
    let mut doc = document(vec![question("Email", text_input("email"))]);
    filler_with(ann_profile()).fill_form(&mut doc);
    assert_eq!(
        doc.events_for(input_of(&doc, "Email")),
        vec![EventKind::Focus, EventKind::Input, EventKind::Change, EventKind::Blur]
    );
}

#[test]
fn empty_profile_fails_without_touching_page() {
    let mut doc = document(contact_questions());
    let mut filler = filler();
    let outcome = filler.fill_form(&mut doc);
    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("No profile data loaded"));
    assert_eq!(outcome.fields_detected, 3);
    assert_eq!(outcome.fields_filled, 0);
    assert!(doc.events().is_empty());

    let results = &filler.statistics().detection_results;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| !r.matched && !r.filled));
    assert!(results.iter().all(|r| r.status == FieldStatus::Unmatched));

    assert_eq!(filler.highlight_unfilled_fields(&mut doc).highlighted_count, 3);
}

#[test]
fn empty_profile_on_empty_page_reports_missing_profile() {
    let mut doc = Document::from_snapshot(&NodeSnapshot::element("body"));
    let outcome = filler().fill_form(&mut doc);
    assert_eq!(outcome.message.as_deref(), Some("No profile data loaded"));
    assert_eq!(outcome.fields_detected, 0);
}

#[test]
fn weaker_key_never_fills_in_for_missing_value() {
    let mut doc = document(vec![
        question("Email address", text_input("email")),
        text_question("First name"),
        text_question("Company name"),
    ]);
    let mut filler = filler_with(
        UserProfile::new()
            .with_text("address", "1 Main St")
            .with_text("firstName", "Ann")
            .with_text("fullName", "Ann Lee"),
    );
    let outcome = filler.fill_form(&mut doc);

    assert_eq!(outcome.fields_filled, 1);
    assert_eq!(doc.value(input_of(&doc, "Email address")), Some(""));
    assert_eq!(doc.value(input_of(&doc, "Company name")), Some(""));
    assert_eq!(doc.value(input_of(&doc, "First name")), Some("Ann"));

    let results = &filler.statistics().detection_results;
    let email = results.iter().find(|r| r.question_label == "Email address").unwrap();
    assert!(!email.matched);
    assert_eq!(email.key, "email");
    assert_eq!(email.status, FieldStatus::Unmatched);
}

#[test]
fn page_without_questions_fails() {
    let mut doc = Document::from_snapshot(&NodeSnapshot::element("body"));
    let outcome = filler_with(ann_profile()).fill_form(&mut doc);
    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("No form questions detected"));
}

#[test]
fn questions_without_input_are_never_filled() {
    let mut doc = document(vec![
        question("Email", NodeSnapshot::element("p").with_text("Section header")),
        text_question("First name"),
    ]);
    let mut filler = filler_with(ann_profile());
    let outcome = filler.fill_form(&mut doc);

    let results = &filler.statistics().detection_results;
    let no_input = results.iter().find(|r| r.question_label == "Email").unwrap();
    assert!(!no_input.has_input_field);
    assert!(!no_input.filled);
    assert_eq!(no_input.status, FieldStatus::NoInput);
    assert_eq!(no_input.input_type, "none");
    assert!(doc.events_for(container_of(&doc, "Email")).is_empty());
    assert_eq!(outcome.fields_filled, 1);
}

#[test]
fn one_failing_field_does_not_abort_the_pass() {
    let mut doc = document(vec![
        question(
            "Email",
            text_input("email").with_listener_error("validator crashed", "https://forms.host/app.js"),
        ),
        question("Phone", text_input("tel").attr("disabled", "")),
        text_question("First name"),
    ]);
    let profile = ann_profile().with_text("phone", "0601020304");
    let mut filler = filler_with(profile);
    let outcome = filler.fill_form(&mut doc);

    assert!(outcome.success);
    assert_eq!(outcome.fields_detected, 3);
    assert_eq!(outcome.fields_filled, 1);
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(outcome.errors[0].question_label, "Email");
    assert!(outcome.errors[0].message.contains("validator crashed"));
    assert!(outcome.errors[1].message.contains("disabled"));

    let statuses: Vec<_> = filler
        .statistics()
        .detection_results
        .iter()
        .map(|r| r.status)
        .collect();
    assert_eq!(
        statuses,
        vec![FieldStatus::Failed, FieldStatus::Failed, FieldStatus::Filled]
    );
}

#[test]
fn foreign_script_errors_are_suppressed_and_field_counts_as_filled() {
    let (mut doc, profile) = fixture_page();
    let logger = memory_logger();
    let mut filler = AutoFiller::new(&FillerConfig::default(), logger.clone()).unwrap();
    filler.update_user_profile(profile);

    let outcome = filler.fill_form(&mut doc);

    assert_eq!(outcome.fields_detected, 4);
    assert_eq!(outcome.fields_filled, 2);
    assert!(outcome.errors.is_empty());
    let noisy = doc.query(doc.body(), "#noisy").unwrap().unwrap();
    assert_eq!(doc.value(noisy), Some("Ann"));
    assert!(logger.count(LogLevel::Warn) >= 1);
    assert!(logger.contains("Suppressed external script error"));
}

#[test]
fn file_upload_is_flagged_not_filled() {
    let (mut doc, profile) = fixture_page();
    let mut filler = filler_with(profile);
    filler.fill_form(&mut doc);

    let cv = filler
        .statistics()
        .detection_results
        .iter()
        .find(|r| r.question_label == "CV")
        .unwrap();
    assert!(cv.matched);
    assert!(!cv.filled);
    assert_eq!(cv.status, FieldStatus::Flagged);
    assert_eq!(cv.key, "fileUpload");
    assert_eq!(cv.value.as_deref(), Some("ann-cv.pdf"));
}

#[test]
fn duplicate_labels_are_skipped() {
    let mut doc = document(vec![
        text_question("First name"),
        text_question("First Name"),
        text_question("Email"),
    ]);
    let mut filler = filler_with(ann_profile());
    let outcome = filler.fill_form(&mut doc);

    assert_eq!(outcome.fields_detected, 2);
    assert_eq!(outcome.fields_skipped, 1);
    assert_eq!(outcome.fields_filled, 2);
}

#[test]
fn unlabeled_questions_get_synthetic_labels() {
    let mut doc = document(vec![
        NodeSnapshot::element("div")
            .attr("role", "listitem")
            .child(text_input("text")),
        text_question("Email"),
    ]);
    let mut filler = filler_with(ann_profile());
    filler.fill_form(&mut doc);
    let first = &filler.statistics().detection_results[0];
    assert_eq!(first.question_label, "Question 1");
    assert!(!first.matched);
    assert!(!first.has_input_field);
}

#[test]
fn fingerprint_identifies_the_form() {
    let mut a = document(contact_questions());
    let mut b = document(contact_questions());
    let fa = filler_with(ann_profile()).fill_form(&mut a).form_fingerprint;
    let fb = filler_with(ann_profile()).fill_form(&mut b).form_fingerprint;
    assert!(fa.is_some());
    assert_eq!(fa, fb);
}

#[test]
fn profile_update_replaces_previous_data() {
    let mut filler = filler_with(ann_profile());
    filler.update_user_profile(UserProfile::new().with_text("city", "Lyon"));
    assert_eq!(filler.get_user_profile().len(), 1);
    assert!(filler.get_user_profile().get("email").is_none());

    let mut doc = document(contact_questions());
    let outcome = filler.fill_form(&mut doc);
    assert_eq!(outcome.fields_filled, 0);
}

// =========================================================================
// Choice widgets
// =========================================================================

#[test]
fn radio_checkbox_select_and_listbox() {
    let mut doc = document(vec![
        radio_question("Gender", &["Female", "Male", "Other"]),
        checkbox_question("Interests", &["Music", "Sport", "Travel"]),
        select_question("Country", &["France", "Spain"]),
        listbox_question("City", &["Paris", "Lyon"]),
    ]);
    let profile = UserProfile::new()
        .with_text("gender", "female")
        .with_text("country", "Spain")
        .with_text("city", "Lyon")
        .with("interests", ProfileValue::List(vec!["Music".into(), "Travel".into()]));
    let mut filler = filler_with(profile);
    let outcome = filler.fill_form(&mut doc);

    assert_eq!(outcome.fields_filled, 4, "{:?}", outcome.errors);
    assert!(doc.is_checked(option_node(&doc, "Female")));
    assert!(!doc.is_checked(option_node(&doc, "Male")));
    assert!(doc.is_checked(option_node(&doc, "Music")));
    assert!(!doc.is_checked(option_node(&doc, "Sport")));
    assert!(doc.is_checked(option_node(&doc, "Travel")));

    let select = doc.query(doc.body(), "select").unwrap().unwrap();
    assert_eq!(doc.value(select), Some("Spain"));

    let lyon = doc.query(doc.body(), r#"[data-value="Lyon"]"#).unwrap().unwrap();
    assert!(doc.is_checked(lyon));
}

#[test]
fn missing_option_is_a_field_error() {
    let mut doc = document(vec![radio_question("Gender", &["Female", "Male"])]);
    let mut filler = filler_with(UserProfile::new().with_text("gender", "Robot"));
    let outcome = filler.fill_form(&mut doc);
    assert_eq!(outcome.fields_filled, 0);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].message.contains("Robot"));
}

#[test]
fn lone_checkbox_takes_affirmative_value() {
    let mut doc = document(vec![checkbox_question("Newsletter", &["Je m'abonne"])]);
    let mut filler = filler_with(UserProfile::new().with_text("Newsletter", "oui"));
    let outcome = filler.fill_form(&mut doc);
    assert_eq!(outcome.fields_filled, 1);
    assert!(doc.is_checked(option_node(&doc, "Je m'abonne")));
}

#[test]
fn date_inputs_receive_iso_dates() {
    let mut doc = document(vec![question("Date of birth", text_input("date"))]);
    let mut filler = filler_with(UserProfile::new().with_text("birthDate", "25/12/1990"));
    filler.fill_form(&mut doc);
    assert_eq!(doc.value(input_of(&doc, "Date of birth")), Some("1990-12-25"));
}

// =========================================================================
// Highlighting
// =========================================================================

#[test]
fn highlighting_twice_does_not_double_count() {
    let (mut doc, profile) = fixture_page();
    let mut filler = filler_with(profile);
    filler.fill_form(&mut doc);

    let first = filler.highlight_unfilled_fields(&mut doc);
    assert!(first.success);
    assert_eq!(first.highlighted_count, 2);
    assert_eq!(highlighted(&doc), 2);

    let second = filler.highlight_unfilled_fields(&mut doc);
    assert!(second.success);
    assert_eq!(second.highlighted_count, 0);
    assert_eq!(highlighted(&doc), 2);
}

#[test]
fn remove_clears_exactly_what_was_highlighted() {
    let mut doc = document(contact_questions());
    let mut filler = filler_with(ann_profile());
    filler.fill_form(&mut doc);

    let added = filler.highlight_unfilled_fields(&mut doc);
    assert_eq!(added.highlighted_count, 1);
    assert!(doc.has_class(container_of(&doc, "Favorite color"), DEFAULT_HIGHLIGHT_CLASS));

    let removed = filler.remove_highlights(&mut doc);
    assert!(removed.success);
    assert_eq!(removed.removed_count, added.highlighted_count);
    assert_eq!(highlighted(&doc), 0);

    let again = filler.remove_highlights(&mut doc);
    assert!(again.success);
    assert_eq!(again.removed_count, 0);
}

#[test]
fn unmatched_containers_without_input_are_highlighted() {
    let mut doc = document(vec![
        question("Favorite color", NodeSnapshot::element("p").with_text("Pick one below")),
        question("Email", NodeSnapshot::element("p").with_text("Section header")),
        text_question("First Name"),
    ]);
    let mut filler = filler_with(ann_profile());
    filler.fill_form(&mut doc);

    let result = filler.highlight_unfilled_fields(&mut doc);
    assert_eq!(result.highlighted_count, 1);
    assert!(doc.has_class(container_of(&doc, "Favorite color"), DEFAULT_HIGHLIGHT_CLASS));
    // matched but nothing to fill: not the user's to fix
    assert!(!doc.has_class(container_of(&doc, "Email"), DEFAULT_HIGHLIGHT_CLASS));
}

#[test]
fn highlight_before_any_pass_is_a_noop() {
    let mut doc = document(contact_questions());
    let result = filler().highlight_unfilled_fields(&mut doc);
    assert!(result.success);
    assert_eq!(result.highlighted_count, 0);
}

#[test]
fn custom_highlight_class_is_used() {
    let config = FillerConfig {
        highlight_class: "needs-you".into(),
        ..FillerConfig::default()
    };
    let mut filler = AutoFiller::new(&config, Arc::new(form_autofill::boundary::logger::NoopLogger)).unwrap();
    filler.update_user_profile(ann_profile());
    let mut doc = document(contact_questions());
    filler.fill_form(&mut doc);
    filler.highlight_unfilled_fields(&mut doc);
    assert_eq!(doc.query_all(doc.body(), ".needs-you").unwrap().len(), 1);
}
