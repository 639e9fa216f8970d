use std::sync::Arc;

use form_autofill::{
    boundary::logger::{Logger, MemoryLogger, NoopLogger},
    controller::{
        controller::{AutoFillController, ControllerConfig},
        page::Page,
    },
    dom::{
        document::{Document, NodeId},
        snapshot::{NodeSnapshot, PageSnapshot},
    },
    filler::filler::{AutoFiller, FillerConfig},
    mapping::profile::UserProfile,
    storage::{
        saved_data::{APP_STATE_KEY, PROFILES_CACHE_KEY},
        store::MemoryStore,
    },
};
use serde_json::{Value, json};

pub const FORM_URL: &str = "https://docs.google.com/forms/d/e/1FAIpQLSf/viewform";

// =========================================================================
// Question builders (Google Forms shaped)
// =========================================================================

pub fn question(label: &str, widget: NodeSnapshot) -> NodeSnapshot {
    NodeSnapshot::element("div")
        .attr("role", "listitem")
        .attr("class", "geS5n")
        .child(
            NodeSnapshot::element("div")
                .attr("role", "heading")
                .with_text(label),
        )
        .child(widget)
}

pub fn text_input(input_type: &str) -> NodeSnapshot {
    NodeSnapshot::element("input").attr("type", input_type)
}

pub fn text_question(label: &str) -> NodeSnapshot {
    question(label, text_input("text"))
}

pub fn radio_question(label: &str, options: &[&str]) -> NodeSnapshot {
    let group = options.iter().fold(
        NodeSnapshot::element("div").attr("role", "radiogroup"),
        |g, o| {
            g.child(
                NodeSnapshot::element("div")
                    .attr("role", "radio")
                    .attr("aria-label", o)
                    .attr("aria-checked", "false"),
            )
        },
    );
    question(label, group)
}

pub fn checkbox_question(label: &str, options: &[&str]) -> NodeSnapshot {
    let list = options.iter().fold(NodeSnapshot::element("div"), |g, o| {
        g.child(
            NodeSnapshot::element("div")
                .attr("role", "checkbox")
                .attr("aria-label", o)
                .attr("aria-checked", "false"),
        )
    });
    question(label, list)
}

pub fn select_question(label: &str, options: &[&str]) -> NodeSnapshot {
    let select = options.iter().fold(NodeSnapshot::element("select"), |s, o| {
        s.child(NodeSnapshot::element("option").attr("value", o).with_text(o))
    });
    question(label, select)
}

pub fn listbox_question(label: &str, options: &[&str]) -> NodeSnapshot {
    let listbox = options.iter().fold(
        NodeSnapshot::element("div").attr("role", "listbox"),
        |l, o| {
            l.child(
                NodeSnapshot::element("div")
                    .attr("role", "option")
                    .attr("data-value", o)
                    .with_text(o),
            )
        },
    );
    question(label, listbox)
}

pub fn file_question(label: &str) -> NodeSnapshot {
    question(
        label,
        NodeSnapshot::element("div")
            .attr("role", "button")
            .with_text("Ajouter un fichier"),
    )
}

pub fn body(questions: Vec<NodeSnapshot>) -> NodeSnapshot {
    let list = questions
        .into_iter()
        .fold(NodeSnapshot::element("div").attr("role", "list"), |l, q| {
            l.child(q)
        });
    NodeSnapshot::element("body").child(NodeSnapshot::element("form").child(list))
}

pub fn document(questions: Vec<NodeSnapshot>) -> Document {
    Document::from_snapshot(&body(questions))
}

pub fn page_snapshot(url: &str, questions: Vec<NodeSnapshot>) -> PageSnapshot {
    PageSnapshot {
        url: url.to_string(),
        title: "Inscription".to_string(),
        body: body(questions),
    }
}

/// The three-question form: two known labels, one unknown.
pub fn contact_questions() -> Vec<NodeSnapshot> {
    vec![
        question("Email address", text_input("email")),
        text_question("First Name"),
        text_question("Favorite color"),
    ]
}

pub fn ann_profile() -> UserProfile {
    UserProfile::new()
        .with_text("email", "a@b.com")
        .with_text("firstName", "Ann")
}

// =========================================================================
// Lookup helpers
// =========================================================================

/// The first input-like element inside the question with this label.
pub fn input_of(doc: &Document, label: &str) -> NodeId {
    let item = container_of(doc, label);
    doc.query(item, "input, textarea, select").unwrap().unwrap()
}

pub fn container_of(doc: &Document, label: &str) -> NodeId {
    doc.query_all(doc.body(), r#"[role="listitem"]"#)
        .unwrap()
        .into_iter()
        .find(|item| doc.text_content(*item).starts_with(label))
        .unwrap_or_else(|| panic!("no question labelled '{}'", label))
}

pub fn option_node(doc: &Document, aria_label: &str) -> NodeId {
    doc.query(doc.body(), &format!(r#"[aria-label="{}"]"#, aria_label))
        .unwrap()
        .unwrap()
}

// =========================================================================
// Filler / controller construction
// =========================================================================

pub fn filler() -> AutoFiller {
    AutoFiller::new(&FillerConfig::default(), Arc::new(NoopLogger)).unwrap()
}

pub fn filler_with(profile: UserProfile) -> AutoFiller {
    let mut f = filler();
    f.update_user_profile(profile);
    f
}

/// Storage holding one cached cloud profile, selected in profiles mode.
pub fn store_with_profile(data: Value) -> MemoryStore {
    MemoryStore::new()
        .with(APP_STATE_KEY, json!({"mode": "profiles", "selectedProfileId": "p1"}))
        .with(
            PROFILES_CACHE_KEY,
            json!([{"id": "p1", "name": "Ann", "data": data}]),
        )
}

pub fn ann_store() -> MemoryStore {
    store_with_profile(json!({"email": "a@b.com", "firstName": "Ann"}))
}

pub fn controller(url: &str, questions: Vec<NodeSnapshot>, store: MemoryStore) -> AutoFillController {
    controller_with_logger(url, questions, store, Arc::new(NoopLogger))
}

pub fn controller_with_logger(
    url: &str,
    questions: Vec<NodeSnapshot>,
    store: MemoryStore,
    logger: Arc<dyn Logger>,
) -> AutoFillController {
    AutoFillController::new(
        Page::from_snapshot(&page_snapshot(url, questions)),
        &FillerConfig::default(),
        ControllerConfig::default(),
        Box::new(store),
        Some(logger),
    )
}

pub fn memory_logger() -> Arc<MemoryLogger> {
    Arc::new(MemoryLogger::new())
}
