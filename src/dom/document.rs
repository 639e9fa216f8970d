use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
    fmt::Write,
    rc::Rc,
};

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::dom::{
    error::DomError,
    query::{self, HtmlIndex, NODE_ID_ATTR, parse_selector},
    snapshot::{NodeSnapshot, ScriptFault},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub value: String,
    pub checked: bool,
    pub listener_error: Option<ScriptFault>,
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A structural change, in the shape a `MutationObserver` reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        target: NodeId,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    Input,
    Change,
    Blur,
    Click,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

// ============================================================================
// Document: arena-backed DOM tree
// ============================================================================

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    mutations: Vec<MutationRecord>,
    events: Vec<DispatchedEvent>,
    // Markup image of the connected tree; dropped on structural or attribute change.
    index: RefCell<Option<Rc<HtmlIndex>>>,
}

impl Document {
    /// Build a document whose body is the given snapshot.
    pub fn from_snapshot(body: &NodeSnapshot) -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: NodeId(0),
            body: NodeId(0),
            mutations: Vec::new(),
            events: Vec::new(),
            index: RefCell::new(None),
        };
        let body_snapshot = if body.is_text() {
            NodeSnapshot::element("body").child(body.clone())
        } else {
            body.clone()
        };
        doc.body = doc.build(Some(doc.root), &body_snapshot);
        doc
    }

    pub fn empty() -> Self {
        Self::from_snapshot(&NodeSnapshot::element("body"))
    }

    fn push_node(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        self.invalidate_index();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    fn build(&mut self, parent: Option<NodeId>, snap: &NodeSnapshot) -> NodeId {
        let Some(tag) = &snap.tag else {
            return self.push_node(parent, NodeData::Text(snap.text.clone().unwrap_or_default()));
        };

        let element = Element {
            tag: tag.to_lowercase(),
            attrs: snap.attrs.clone(),
            value: snap
                .value
                .clone()
                .or_else(|| snap.attrs.get("value").cloned())
                .unwrap_or_default(),
            checked: snap.checked || snap.attrs.contains_key("checked"),
            listener_error: snap.listener_error.clone(),
        };
        let id = self.push_node(parent, NodeData::Element(element));

        if let Some(text) = &snap.text {
            self.push_node(Some(id), NodeData::Text(text.clone()));
        }
        for child in &snap.children {
            self.build(Some(id), child);
        }
        id
    }

    /// Serialize a subtree back into snapshot form.
    pub fn to_snapshot(&self, id: NodeId) -> NodeSnapshot {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => NodeSnapshot::text_node(t),
            NodeData::Document => {
                let mut snap = NodeSnapshot::element("#document");
                snap.children = self.children(id).iter().map(|c| self.to_snapshot(*c)).collect();
                snap
            }
            NodeData::Element(el) => NodeSnapshot {
                tag: Some(el.tag.clone()),
                attrs: el.attrs.clone(),
                text: None,
                children: self.children(id).iter().map(|c| self.to_snapshot(*c)).collect(),
                value: (!el.value.is_empty()).then(|| el.value.clone()),
                checked: el.checked,
                listener_error: el.listener_error.clone(),
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // ---- Tree navigation ----

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0).map(|n| &n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Ok(el),
            _ => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|el| el.attrs.get(name))
            .map(String::as_str)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if self.is_element(current) {
                out.push(current);
            }
            cursor = self.parent(current);
        }
        out
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether the node is still attached under the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Concatenated descendant text with whitespace collapsed.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(Node {
            data: NodeData::Text(t),
            ..
        }) = self.nodes.get(id.0)
        {
            parts.push(t.as_str());
        }
        for d in self.descendants(id) {
            if let NodeData::Text(t) = &self.nodes[d.0].data {
                parts.push(t.as_str());
            }
        }
        parts
            .iter()
            .flat_map(|p| p.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First descendant text node with non-blank content.
    pub fn first_text(&self, id: NodeId) -> Option<String> {
        self.descendants(id).into_iter().find_map(|d| match &self.nodes[d.0].data {
            NodeData::Text(t) if !t.trim().is_empty() => Some(t.trim().to_string()),
            _ => None,
        })
    }

    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(element_id))
    }

    // ---- Selector queries ----
    //
    // Selectors run against a parsed markup image of the tree that holds
    // the node, so combinators see the whole document as in a browser.

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.is_element(id) && self.matching(id, selector).contains(&id)
    }

    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let hits = self.matching(scope, selector);
        if hits.is_empty() {
            return Vec::new();
        }
        self.descendants(scope)
            .into_iter()
            .filter(|n| hits.contains(n))
            .collect()
    }

    pub fn select_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let hits = self.matching(scope, selector);
        if hits.is_empty() {
            return None;
        }
        self.descendants(scope).into_iter().find(|n| hits.contains(n))
    }

    pub fn query_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self.select(scope, &parse_selector(selector)?))
    }

    pub fn query(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.select_first(scope, &parse_selector(selector)?))
    }

    /// Nearest inclusive ancestor matching the selector.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let hits = self.matching(id, selector);
        if hits.contains(&id) {
            return Some(id);
        }
        self.ancestors(id).into_iter().find(|a| hits.contains(a))
    }

    fn matching(&self, anchor: NodeId, selector: &Selector) -> HashSet<NodeId> {
        if anchor.0 >= self.nodes.len() {
            return HashSet::new();
        }
        let top = self.tree_top(anchor);
        if top != self.root {
            return HtmlIndex::parse(&self.render_markup(top)).matching(selector);
        }
        let index = self
            .index
            .borrow_mut()
            .get_or_insert_with(|| Rc::new(HtmlIndex::parse(&self.render_markup(top))))
            .clone();
        index.matching(selector)
    }

    fn tree_top(&self, id: NodeId) -> NodeId {
        let mut top = id;
        while let Some(parent) = self.parent(top) {
            top = parent;
        }
        top
    }

    fn invalidate_index(&mut self) {
        *self.index.get_mut() = None;
    }

    /// HTML for the tree rooted at `top`, every element tagged with its id.
    /// A detached subtree is rendered as the content of an empty body.
    fn render_markup(&self, top: NodeId) -> String {
        let mut out = String::from("<!DOCTYPE html><html><head></head>");
        if top == self.root {
            for child in self.children(top) {
                self.write_markup(*child, &mut out);
            }
        } else {
            out.push_str("<body>");
            self.write_markup(top, &mut out);
            out.push_str("</body>");
        }
        out.push_str("</html>");
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let el = match &self.nodes[id.0].data {
            NodeData::Text(t) => return query::escape_text(t, out),
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_markup(*child, out);
                }
                return;
            }
            NodeData::Element(el) => el,
        };

        if !query::is_markup_name(&el.tag) {
            for child in self.children(id) {
                self.write_markup(*child, out);
            }
            return;
        }

        let _ = write!(out, r#"<{} {}="{}""#, el.tag, NODE_ID_ATTR, id.0);
        for (name, value) in &el.attrs {
            if name == NODE_ID_ATTR || !query::is_markup_name(name) {
                continue;
            }
            let _ = write!(out, r#" {}=""#, name);
            query::escape_attr(value, out);
            out.push('"');
        }
        out.push('>');

        if query::is_void(&el.tag) {
            return;
        }
        for child in self.children(id) {
            self.write_markup(*child, out);
        }
        let _ = write!(out, "</{}>", el.tag);
    }

    // ---- Attributes & class list ----

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        if el.attrs.get(name).map(String::as_str) == Some(value) {
            return Ok(());
        }
        el.attrs.insert(name.to_string(), value.to_string());
        self.invalidate_index();
        self.mutations.push(MutationRecord::Attributes {
            target: id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        if el.attrs.remove(name).is_some() {
            self.invalidate_index();
            self.mutations.push(MutationRecord::Attributes {
                target: id,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Add a class; returns false when it was already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<bool, DomError> {
        if self.has_class(id, class) {
            return Ok(false);
        }
        let current = self.attr(id, "class").unwrap_or("").trim().to_string();
        let updated = if current.is_empty() {
            class.to_string()
        } else {
            format!("{} {}", current, class)
        };
        self.set_attribute(id, "class", &updated)?;
        Ok(true)
    }

    /// Remove a class; returns false when it was not present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<bool, DomError> {
        if !self.has_class(id, class) {
            return Ok(false);
        }
        let updated = self
            .attr(id, "class")
            .unwrap_or("")
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &updated)?;
        Ok(true)
    }

    // ---- Structural mutation ----

    /// Append a snapshot subtree under `parent`, recording a child-list mutation.
    pub fn append_subtree(&mut self, parent: NodeId, snap: &NodeSnapshot) -> Result<NodeId, DomError> {
        if self.element(parent).is_none() {
            return Err(DomError::UnknownNode(parent));
        }
        let id = self.build(Some(parent), snap);
        self.mutations.push(MutationRecord::ChildList {
            target: parent,
            added: vec![id],
            removed: vec![],
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::UnknownNode(id))?;
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
        self.invalidate_index();
        self.mutations.push(MutationRecord::ChildList {
            target: parent,
            added: vec![],
            removed: vec![id],
        });
        Ok(())
    }

    /// Drain the pending mutation records.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    // ---- Form state & events ----

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.value.as_str())
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.value = value.to_string();
        Ok(())
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), DomError> {
        self.element_mut(id)?.checked = checked;
        Ok(())
    }

    /// Checked state of a native input or an ARIA radio/checkbox/option.
    pub fn is_checked(&self, id: NodeId) -> bool {
        match self.element(id) {
            Some(el) if el.tag == "input" => el.checked,
            Some(el) => {
                el.attrs.get("aria-checked").map(String::as_str) == Some("true")
                    || el.attrs.get("aria-selected").map(String::as_str) == Some("true")
            }
            None => false,
        }
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| {
            el.attrs.contains_key("disabled")
                || el.attrs.get("aria-disabled").map(String::as_str) == Some("true")
        })
    }

    pub fn is_readonly(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| {
            el.attrs.contains_key("readonly")
                || el.attrs.get("aria-readonly").map(String::as_str) == Some("true")
        })
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn events_for(&self, id: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.kind)
            .collect()
    }

    /// Dispatch an event. Page listeners run after the event is logged, so
    /// a listener failure never undoes what was already written.
    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) -> Result<(), DomError> {
        let fault = self.element(id).ok_or(DomError::UnknownNode(id))?.listener_error.clone();
        self.events.push(DispatchedEvent { target: id, kind });
        match fault {
            Some(f) => Err(DomError::Script {
                message: f.message,
                source: f.source,
            }),
            None => Ok(()),
        }
    }

    /// Simulated user click, including the default action of
    /// radios, checkboxes, listboxes and options.
    pub fn click(&mut self, id: NodeId) -> Result<(), DomError> {
        let (tag, role, input_type) = {
            let el = self.element(id).ok_or(DomError::UnknownNode(id))?;
            (
                el.tag.clone(),
                el.attrs.get("role").cloned(),
                el.attrs.get("type").map(|t| t.to_lowercase()),
            )
        };

        match (tag.as_str(), role.as_deref(), input_type.as_deref()) {
            ("input", _, Some("radio")) => {
                let name = self.attr(id, "name").map(str::to_string);
                if let Some(name) = name {
                    let group = self.query_all(self.root, &format!(r#"input[name="{}"]"#, name))?;
                    for other in group {
                        self.set_checked(other, false)?;
                    }
                }
                self.set_checked(id, true)?;
            }
            ("input", _, Some("checkbox")) => {
                let checked = self.is_checked(id);
                self.set_checked(id, !checked)?;
            }
            (_, Some("radio"), _) => {
                let group_sel = parse_selector(r#"[role="radiogroup"]"#)?;
                let scope = self
                    .closest(id, &group_sel)
                    .or_else(|| self.parent(id))
                    .unwrap_or(self.root);
                let radio_sel = parse_selector(r#"[role="radio"]"#)?;
                for other in self.select(scope, &radio_sel) {
                    if other != id {
                        self.set_attribute(other, "aria-checked", "false")?;
                    }
                }
                self.set_attribute(id, "aria-checked", "true")?;
            }
            (_, Some("checkbox"), _) => {
                let next = if self.is_checked(id) { "false" } else { "true" };
                self.set_attribute(id, "aria-checked", next)?;
            }
            (_, Some("listbox"), _) => {
                let expanded = self.attr(id, "aria-expanded") == Some("true");
                self.set_attribute(id, "aria-expanded", if expanded { "false" } else { "true" })?;
            }
            (_, Some("option"), _) => {
                let listbox_sel = parse_selector(r#"[role="listbox"]"#)?;
                if let Some(listbox) = self.closest(id, &listbox_sel) {
                    let option_sel = parse_selector(r#"[role="option"]"#)?;
                    for other in self.select(listbox, &option_sel) {
                        if other != id {
                            self.set_attribute(other, "aria-selected", "false")?;
                        }
                    }
                    self.set_attribute(listbox, "aria-expanded", "false")?;
                }
                self.set_attribute(id, "aria-selected", "true")?;
            }
            _ => {}
        }

        self.dispatch(id, EventKind::Click)
    }
}
