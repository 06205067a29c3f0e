//! Persistent application settings.
//!
//! Settings are stored as JSON in the app data directory and survive restarts.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application settings persisted to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the booking backend, without trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout for backend calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Cache database file name, relative to the app data directory.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_database_file() -> String {
    "skyway_cache.db".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            database_file: default_database_file(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Returns defaults if file doesn't exist.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings file: {} — using defaults", e);
                Self::default()
            }),
            Err(_) => {
                tracing::info!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
