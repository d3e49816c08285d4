use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::grid::{
    DEFAULT_DOCUMENT_RELOAD_DELAY_MS, DEFAULT_HOVER_LEAVE_DELAY_MS, DEFAULT_HOVER_RATE,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the library service exposing the watched folder.
    pub server_url: String,
    /// Speed-up factor applied to playing media under the pointer.
    pub hover_rate: f32,
    /// Debounce before a hover-leave takes effect.
    pub hover_leave_delay_ms: u64,
    /// Gap between blanking and restoring a document on forced reload.
    pub document_reload_delay_ms: u64,
    /// Whether the grid contents survive a restart.
    pub persist_session: bool,
    /// Initial tile zoom factor.
    pub default_zoom: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5001".to_string(),
            hover_rate: DEFAULT_HOVER_RATE,
            hover_leave_delay_ms: DEFAULT_HOVER_LEAVE_DELAY_MS,
            document_reload_delay_ms: DEFAULT_DOCUMENT_RELOAD_DELAY_MS,
            persist_session: true,
            default_zoom: 1.0,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to read config file at {}: {}",
                    config_path.display(),
                    e
                )
            })?;

            // If the file is damaged or from an incompatible version, fall
            // back to defaults rather than refusing to start.
            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!(
                        "Config file exists but has issues ({}), creating new one with defaults",
                        e
                    );
                    let new_config = Self::default();
                    new_config.save().map_err(|save_err| {
                        anyhow::anyhow!("Failed to save new config: {}", save_err)
                    })?;
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config
                .save()
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("media-wall")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Where the persisted session list lives, next to the config.
    pub fn session_path() -> PathBuf {
        Self::config_dir().join("session.json")
    }
}
