use form_autofill::{
    controller::{
        controller::{AutoFillController, ControllerConfig},
        page::Page,
    },
    detect::detector::DetectorConfig,
    filler::filler::FillerConfig,
    messaging::{
        handler::{MessageHandler, NOT_INITIALIZED},
        protocol::{Request, Response},
    },
    storage::store::MemoryStore,
};
use serde_json::json;

use crate::common::fixtures::{
    FORM_URL, ann_store, contact_questions, controller, input_of, page_snapshot,
};

mod common;

fn form_controller() -> AutoFillController {
    controller(FORM_URL, contact_questions(), MemoryStore::new())
}

#[test]
fn requests_decode_from_action_tag() {
    let fill: Request = serde_json::from_value(json!({
        "action": "fillForm",
        "userData": {"email": "a@b.com"}
    }))
    .unwrap();
    assert!(matches!(fill, Request::FillForm { user_data: Some(_) }));

    let bare: Request = serde_json::from_value(json!({"action": "fillForm"})).unwrap();
    assert_eq!(bare, Request::FillForm { user_data: None });

    let highlight: Request =
        serde_json::from_value(json!({"action": "highlightUnfilledFields"})).unwrap();
    assert_eq!(highlight, Request::HighlightUnfilledFields);
}

#[test]
fn fill_form_with_user_data() {
    let mut c = form_controller();
    let response = MessageHandler::handle_value(
        &mut c,
        json!({"action": "fillForm", "userData": {"email": "a@b.com", "firstName": "Ann"}}),
    );

    assert!(response.success);
    let results = response.results.unwrap();
    assert_eq!(results.fields_detected, 3);
    assert_eq!(results.fields_filled, 2);
    assert_eq!(
        c.page().document.value(input_of(&c.page().document, "First Name")),
        Some("Ann")
    );
}

#[test]
fn fill_form_without_data_uses_current_profile() {
    let mut c = form_controller();
    let response = MessageHandler::handle_value(&mut c, json!({"action": "fillForm"}));
    assert!(!response.success);
    let results = response.results.unwrap();
    assert_eq!(results.message.as_deref(), Some("No profile data loaded"));
}

#[test]
fn unusable_user_data_is_a_failure_response() {
    let mut c = form_controller();
    let response =
        MessageHandler::handle_value(&mut c, json!({"action": "fillForm", "userData": [1, 2]}));
    assert!(!response.success);
    assert!(response.results.is_none());
    assert!(
        response
            .message
            .unwrap()
            .starts_with("Error occurred while filling form")
    );
}

#[test]
fn profile_and_mappings_are_exposed() {
    let mut c = form_controller();
    MessageHandler::handle_value(
        &mut c,
        json!({"action": "fillForm", "userData": {"data": {"email": "a@b.com"}}}),
    );

    let profile = MessageHandler::handle_value(&mut c, json!({"action": "getUserProfile"}));
    assert!(profile.success);
    assert_eq!(
        serde_json::to_value(profile.profile.unwrap()).unwrap(),
        json!({"email": "a@b.com"})
    );

    let mappings = MessageHandler::handle_value(&mut c, json!({"action": "getFieldMappings"}));
    assert!(mappings.success);
    let table = mappings.mappings.unwrap();
    assert!(table.to_string().contains("firstName"));
}

#[test]
fn highlight_then_remove_round() {
    let mut c = form_controller();
    MessageHandler::handle_value(
        &mut c,
        json!({"action": "fillForm", "userData": {"email": "a@b.com", "firstName": "Ann"}}),
    );

    let first = MessageHandler::handle(&mut c, Request::HighlightUnfilledFields);
    assert!(first.success);
    assert_eq!(first.highlighted_count, Some(1));

    let second = MessageHandler::handle(&mut c, Request::HighlightUnfilledFields);
    assert_eq!(second.highlighted_count, Some(0));

    let removed = MessageHandler::handle(&mut c, Request::RemoveHighlights);
    assert!(removed.success);
    assert_eq!(removed.removed_count, Some(1));
}

#[test]
fn unknown_action_is_answered_with_error() {
    let mut c = form_controller();
    let response = MessageHandler::handle_value(&mut c, json!({"action": "launchRockets"}));
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Unknown or malformed action: launchRockets")
    );

    let missing = MessageHandler::handle_value(&mut c, json!({"hello": true}));
    assert_eq!(
        missing.error.as_deref(),
        Some("Unknown or malformed action: <missing>")
    );
}

#[test]
fn uninitialized_filler_answers_every_request() {
    let config = FillerConfig {
        detector: DetectorConfig {
            label_selectors: vec!["h1 > ".into()],
            ..DetectorConfig::default()
        },
        ..FillerConfig::default()
    };
    let mut c = AutoFillController::new(
        Page::from_snapshot(&page_snapshot(FORM_URL, contact_questions())),
        &config,
        ControllerConfig::default(),
        Box::new(ann_store()),
        None,
    );
    assert!(c.filler().is_none());

    for request in [
        Request::FillForm { user_data: None },
        Request::GetUserProfile,
        Request::GetFieldMappings,
        Request::HighlightUnfilledFields,
        Request::RemoveHighlights,
    ] {
        let response = MessageHandler::handle(&mut c, request);
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some(NOT_INITIALIZED));
    }
}

#[test]
fn responses_omit_irrelevant_fields() {
    let response = Response {
        highlighted_count: Some(2),
        ..Response::ok()
    };
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": true, "highlightedCount": 2})
    );
    assert_eq!(
        serde_json::to_value(Response::error("boom")).unwrap(),
        json!({"success": false, "error": "boom"})
    );
}
