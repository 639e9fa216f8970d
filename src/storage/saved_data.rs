use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    mapping::profile::UserProfile,
    storage::store::{Store, StoreError},
};

// Storage keys shared with the popup/background side.
pub const SETTINGS_KEY: &str = "autoFillSettings";
pub const APP_STATE_KEY: &str = "appState";
pub const PROFILES_CACHE_KEY: &str = "cloudProfilesCache";
pub const PROFILES_VERSION_KEY: &str = "profilesVersion";
pub const PROFILES_LAST_UPDATE_KEY: &str = "profilesLastUpdate";
pub const LAST_CSV_KEY: &str = "lastCsvData";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFillSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for AutoFillSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    Profiles,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub mode: AppMode,
    #[serde(default)]
    pub selected_profile_id: Option<Value>,
}

fn id_matches(candidate: Option<&Value>, wanted: &Value) -> bool {
    let as_text = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    match (candidate.and_then(as_text), as_text(wanted)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Profile data for unattended filling, following the persisted app state.
///
/// Returns `Ok(None)` when auto-fill is disabled or nothing usable is
/// stored; malformed records are treated as absent.
pub fn load_saved_user_data(store: &dyn Store) -> Result<Option<UserProfile>, StoreError> {
    let settings: AutoFillSettings = store
        .get(SETTINGS_KEY)?
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    if !settings.enabled {
        return Ok(None);
    }

    let Some(state) = store
        .get(APP_STATE_KEY)?
        .and_then(|v| serde_json::from_value::<AppState>(v).ok())
    else {
        return Ok(None);
    };

    let record = match state.mode {
        AppMode::Profiles => {
            let Some(selected) = state.selected_profile_id.filter(|v| !v.is_null()) else {
                return Ok(None);
            };
            store
                .get(PROFILES_CACHE_KEY)?
                .and_then(|cache| match cache {
                    Value::Array(profiles) => profiles
                        .into_iter()
                        .find(|p| id_matches(p.get("id"), &selected)),
                    _ => None,
                })
        }
        // A cached dataset may be the row list; the first row is used.
        AppMode::Csv => store.get(LAST_CSV_KEY)?.and_then(|v| match v {
            Value::Array(rows) => rows.into_iter().next(),
            Value::Null => None,
            other => Some(other),
        }),
    };

    Ok(record
        .and_then(|r| UserProfile::from_json(&r).ok())
        .filter(|p| !p.is_empty()))
}
