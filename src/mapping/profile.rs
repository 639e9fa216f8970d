use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detect::label::match_key;

/// A single profile entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Text(String),
    List(Vec<String>),
    File {
        #[serde(rename = "fileName")]
        file_name: String,
        #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

impl ProfileValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ProfileValue::Text(t) => t.trim().is_empty(),
            ProfileValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
            ProfileValue::File { file_name, .. } => file_name.trim().is_empty(),
        }
    }

    /// Individual choices: list items, or a text split on `;` / `,`.
    pub fn choices(&self) -> Vec<String> {
        match self {
            ProfileValue::Text(t) => t
                .split([';', ','])
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ProfileValue::List(items) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ProfileValue::File { file_name, .. } => vec![file_name.clone()],
        }
    }

    /// Display form used in detection results and text fields.
    pub fn display(&self) -> String {
        match self {
            ProfileValue::Text(t) => t.clone(),
            ProfileValue::List(items) => items.join(", "),
            ProfileValue::File { file_name, .. } => file_name.clone(),
        }
    }
}

#[derive(Debug)]
pub enum ProfileError {
    /// Profile JSON was not an object
    NotAnObject,

    /// CSV could not be read or parsed
    Csv(csv::Error),

    /// Requested row index is past the end of the CSV data
    RowOutOfRange { row: usize, rows: usize },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::NotAnObject => write!(f, "Profile data must be a JSON object"),
            ProfileError::Csv(e) => write!(f, "CSV error: {}", e),
            ProfileError::RowOutOfRange { row, rows } => {
                write!(f, "CSV row {} requested but only {} data rows present", row, rows)
            }
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for ProfileError {
    fn from(e: csv::Error) -> Self {
        ProfileError::Csv(e)
    }
}

// ============================================================================
// UserProfile
// ============================================================================

/// Profile data keyed by field key (or raw column header).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile {
    values: BTreeMap<String, ProfileValue>,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: ProfileValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_text(self, key: &str, value: &str) -> Self {
        self.with(key, ProfileValue::Text(value.to_string()))
    }

    pub fn insert(&mut self, key: &str, value: ProfileValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ProfileValue)> {
        self.values.iter()
    }

    /// First non-empty value whose key matches any of `keys`, ignoring
    /// case and separators.
    pub fn lookup(&self, keys: &[String]) -> Option<(&String, &ProfileValue)> {
        let wanted: Vec<String> = keys.iter().map(|k| match_key(k)).collect();
        wanted.iter().find_map(|w| {
            self.values
                .iter()
                .find(|(k, v)| match_key(k) == *w && !v.is_empty())
        })
    }

    pub fn get(&self, key: &str) -> Option<&ProfileValue> {
        self.lookup(&[key.to_string()]).map(|(_, v)| v)
    }

    /// Build from a JSON record. A cloud profile record keeps its fields
    /// under `data` (or `fields`); a CSV-cached row is flat.
    pub fn from_json(value: &Value) -> Result<Self, ProfileError> {
        let object = value.as_object().ok_or(ProfileError::NotAnObject)?;
        let fields = ["data", "fields"]
            .iter()
            .find_map(|k| object.get(*k).and_then(Value::as_object))
            .unwrap_or(object);

        let mut profile = Self::new();
        for (key, raw) in fields {
            if key == "id" {
                continue;
            }
            if let Some(v) = json_to_value(raw) {
                profile.insert(key, v);
            }
        }
        Ok(profile)
    }

    /// Build from one data row of CSV text (first line is the header).
    pub fn from_csv<R: Read>(reader: R, row: usize) -> Result<Self, ProfileError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut rows = 0usize;
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            rows += 1;
            if index != row {
                continue;
            }
            let mut profile = Self::new();
            for (header, cell) in headers.iter().zip(record.iter()) {
                if !header.is_empty() && !cell.is_empty() {
                    profile.insert(header, ProfileValue::Text(cell.to_string()));
                }
            }
            return Ok(profile);
        }

        Err(ProfileError::RowOutOfRange { row, rows })
    }
}

fn json_to_value(raw: &Value) -> Option<ProfileValue> {
    match raw {
        Value::String(s) => Some(ProfileValue::Text(s.clone())),
        Value::Number(n) => Some(ProfileValue::Text(n.to_string())),
        Value::Bool(b) => Some(ProfileValue::Text(b.to_string())),
        Value::Array(items) => Some(ProfileValue::List(
            items
                .iter()
                .filter_map(|i| match i {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        )),
        Value::Object(map) => map
            .get("fileName")
            .and_then(Value::as_str)
            .map(|name| ProfileValue::File {
                file_name: name.to_string(),
                mime_type: map.get("mimeType").and_then(Value::as_str).map(str::to_string),
            }),
        Value::Null => None,
    }
}
