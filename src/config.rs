//! Console Configuration
//!
//! Operator-tunable settings for the console itself, loaded from TOML.
//! The monitoring parameters live on the backend; this file only covers how
//! the console reaches it and how much history it pulls.
//!
//! ## Loading Order
//!
//! 1. `CUSUM_CONSOLE_CONFIG` environment variable (path to TOML file)
//! 2. `console.toml` in the current working directory
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Config load failures.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleConfigError {
    #[error("config I/O error ({0}): {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("config parse error ({0}): {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Root console configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// History fetch tuning.
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// `[backend]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the defect warning service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// `[history]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Row cap requested per dashboard search.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// Alert rows shown in the dashboard table.
    #[serde(default = "default_alert_table_cap")]
    pub alert_table_cap: usize,

    /// Hours of context on either side of a drill-down record.
    #[serde(default = "default_detail_window_hours")]
    pub detail_window_hours: i64,
}

fn default_fetch_limit() -> u32 {
    20_000
}

fn default_alert_table_cap() -> usize {
    crate::history::RECENT_ALERTS_CAP
}

fn default_detail_window_hours() -> i64 {
    crate::history::DETAIL_WINDOW_HOURS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            fetch_limit: default_fetch_limit(),
            alert_table_cap: default_alert_table_cap(),
            detail_window_hours: default_detail_window_hours(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration using the standard search order:
    /// 1. `$CUSUM_CONSOLE_CONFIG` environment variable
    /// 2. `./console.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("CUSUM_CONSOLE_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), backend = %config.backend.base_url, "Loaded console config from CUSUM_CONSOLE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from CUSUM_CONSOLE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "CUSUM_CONSOLE_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("console.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(backend = %config.backend.base_url, "Loaded console config from ./console.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./console.toml, using defaults");
                }
            }
        }

        info!("No console.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path. Unknown keys are ignored so
    /// older config files keep working.
    pub fn load_from_file(path: &Path) -> Result<Self, ConsoleConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConsoleConfigError::Io(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConsoleConfigError::Parse(path.to_path_buf(), e))
    }
}
