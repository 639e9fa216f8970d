use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::storage::{
    saved_data::{PROFILES_CACHE_KEY, PROFILES_LAST_UPDATE_KEY, PROFILES_VERSION_KEY},
    store::{Store, StoreError},
};

#[derive(Debug)]
pub enum CloudError {
    Http(reqwest::Error),
    Status { endpoint: String, status: u16 },
    Format(String),
    Store(StoreError),
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudError::Http(e) => write!(f, "Profile request failed: {}", e),
            CloudError::Status { endpoint, status } => {
                write!(f, "Profile endpoint {} answered HTTP {}", endpoint, status)
            }
            CloudError::Format(msg) => write!(f, "Unexpected profile payload: {}", msg),
            CloudError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CloudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CloudError::Http(e) => Some(e),
            CloudError::Store(e) => Some(e),
            _ => None,
        }
    }
}

/// Either a bare profile list or a versioned envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfilesPayload {
    Envelope {
        #[serde(default)]
        version: Option<Value>,
        profiles: Vec<Value>,
    },
    List(Vec<Value>),
}

/// Fetches cloud profiles and refreshes the local cache keys.
pub struct CloudProfileClient {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl CloudProfileClient {
    pub fn new(endpoint: &str) -> Result<Self, CloudError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(CloudError::Http)?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn fetch(&self) -> Result<(Option<Value>, Vec<Value>), CloudError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .map_err(CloudError::Http)?;

        if !response.status().is_success() {
            return Err(CloudError::Status {
                endpoint: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().map_err(CloudError::Http)?;
        parse_payload(body)
    }

    /// Fetch and write cache, version and timestamp. Returns the profile count.
    pub fn sync_into(&self, store: &mut dyn Store) -> Result<usize, CloudError> {
        let (version, profiles) = self.fetch()?;
        write_cache(store, version, profiles)
    }
}

pub fn parse_payload(body: Value) -> Result<(Option<Value>, Vec<Value>), CloudError> {
    let payload: ProfilesPayload =
        serde_json::from_value(body).map_err(|e| CloudError::Format(e.to_string()))?;
    let (version, profiles) = match payload {
        ProfilesPayload::Envelope { version, profiles } => (version, profiles),
        ProfilesPayload::List(profiles) => (None, profiles),
    };
    if let Some(bad) = profiles.iter().position(|p| p.get("id").is_none()) {
        return Err(CloudError::Format(format!("profile #{} has no id", bad)));
    }
    Ok((version, profiles))
}

pub fn write_cache(
    store: &mut dyn Store,
    version: Option<Value>,
    profiles: Vec<Value>,
) -> Result<usize, CloudError> {
    let count = profiles.len();
    store
        .set(PROFILES_CACHE_KEY, Value::Array(profiles))
        .map_err(CloudError::Store)?;
    if let Some(v) = version {
        store.set(PROFILES_VERSION_KEY, v).map_err(CloudError::Store)?;
    }
    store
        .set(
            PROFILES_LAST_UPDATE_KEY,
            Value::String(chrono::Utc::now().to_rfc3339()),
        )
        .map_err(CloudError::Store)?;
    Ok(count)
}
