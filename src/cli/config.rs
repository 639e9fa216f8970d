use std::fmt;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::{controller::controller::ControllerConfig, filler::filler::FillerConfig};

pub const DEFAULT_CONFIG_PATH: &str = "form-autofill.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Detect, match and fill questionnaire forms from saved profiles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append controller decisions to this JSONL file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List detected questions and their widgets
    Detect {
        /// Page snapshot JSON
        #[arg(long)]
        page: String,
    },

    /// Fill a page snapshot from a profile
    Fill {
        #[arg(long)]
        page: String,

        /// Profile JSON object (flat or cloud record)
        #[arg(long, conflicts_with = "csv")]
        profile: Option<String>,

        /// CSV file whose header row names the fields
        #[arg(long)]
        csv: Option<String>,

        /// Data row of the CSV file (0-based)
        #[arg(long, default_value_t = 0)]
        row: usize,

        /// Write the filled snapshot here
        #[arg(short, long)]
        output: Option<String>,

        /// Print the outcome as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Fill, then mark questions still needing the user
    Highlight {
        #[arg(long)]
        page: String,

        #[arg(long)]
        profile: String,

        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the field mapping table
    Mappings,

    /// Replay scenario YAML files through the page controller
    Replay {
        /// Scenario file or directory of scenario files
        #[arg(long)]
        scenario: String,
    },

    /// Answer JSON messages from stdin, one per line
    Serve {
        #[arg(long)]
        page: String,

        /// Extension storage file (JSON object)
        #[arg(long)]
        store: Option<String>,
    },

    /// Download cloud profiles into a storage file
    SyncProfiles {
        /// Profile endpoint URL (overrides the config file)
        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long)]
        store: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub filler: FillerConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: String,

    pub profiles_endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            profiles_endpoint: None,
        }
    }
}

// Serde default helpers
fn default_store_path() -> String {
    "autofill-storage.json".to_string()
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: String, source: std::io::Error },
    Parse { path: String, source: serde_yaml::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Could not read config '{}': {}", path, source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Invalid config '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. A missing file yields defaults; a file
/// that exists but does not parse is an error.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) if content.trim().is_empty() => Ok(AppConfig::default()),
        Ok(content) => serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path.to_string(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: config_path.to_string(),
            source,
        }),
    }
}

/// CLI value first, then config file.
pub fn resolve_store_path(cli: Option<&str>, config: &AppConfig) -> String {
    cli.map(str::to_string)
        .unwrap_or_else(|| config.storage.path.clone())
}
