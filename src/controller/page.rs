use serde::{Deserialize, Serialize};

use crate::dom::{document::Document, snapshot::PageSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageType {
    GoogleForms,
    Generic,
    Unknown,
}

impl PageType {
    /// Only Google Forms pages get unattended filling.
    pub fn qualifies(&self) -> bool {
        matches!(self, PageType::GoogleForms)
    }
}

pub fn detect_page_type(url: &str) -> PageType {
    let lower = url.trim().to_lowercase();
    let Some(rest) = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
    else {
        return PageType::Unknown;
    };

    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        return PageType::Unknown;
    }

    match host {
        "docs.google.com" if path.starts_with("forms") => PageType::GoogleForms,
        "forms.gle" => PageType::GoogleForms,
        _ => PageType::Generic,
    }
}

/// The live page the controller works on.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub document: Document,
}

impl Page {
    pub fn new(url: &str, document: Document) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            document,
        }
    }

    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        Self {
            url: snapshot.url.clone(),
            title: snapshot.title.clone(),
            document: Document::from_snapshot(&snapshot.body),
        }
    }

    pub fn page_type(&self) -> PageType {
        detect_page_type(&self.url)
    }
}
