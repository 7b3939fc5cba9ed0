//! Client configuration

use crate::utils::error::{Result, VidloaderError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable that overrides the configured backend address
pub const BASE_URL_ENV: &str = "VIDLOADER_BASE_URL";

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Backend origin, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Path prefix shared by every endpoint
    pub api_prefix: String,

    /// Capacity of the queue carrying progress updates to the store
    pub update_buffer: usize,

    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api".to_string(),
            update_buffer: 100,
            user_agent: concat!("vidloader/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientSettings {
    /// Default location of the settings file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidloader")
            .join("config.json")
    }

    /// Load settings from a JSON file. A missing file yields defaults.
    /// `VIDLOADER_BASE_URL` wins over whatever the file says.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let parsed: ClientSettings = serde_json::from_str(&raw).map_err(|e| {
                VidloaderError::Config(format!("{}: {}", path.display(), e))
            })?;
            info!("Loaded settings from {}", path.display());
            parsed
        } else {
            debug!("No settings file at {}, using defaults", path.display());
            ClientSettings::default()
        };

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                settings.base_url = url;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(VidloaderError::Config("base_url must not be empty".into()));
        }
        if self.update_buffer == 0 {
            return Err(VidloaderError::Config(
                "update_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
