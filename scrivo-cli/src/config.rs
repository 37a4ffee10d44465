//! Persistent CLI configuration (JSON file in the platform data directory).

use std::fs;
use std::path::{Path, PathBuf};

use scrivo_core::ModelSize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the transcription service.
    pub server_url: String,
    /// Model size used when `--model-size` is omitted.
    pub default_model_size: ModelSize,
    /// Optional whole-request timeout in seconds (unset = wait indefinitely).
    pub request_timeout_secs: Option<u64>,
    /// Optional `limit` forwarded to the history endpoint (1..=100).
    pub history_limit: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            default_model_size: ModelSize::default(),
            request_timeout_secs: None,
            history_limit: None,
        }
    }
}

impl AppConfig {
    pub fn normalize(&mut self) {
        let trimmed = self.server_url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            self.server_url = AppConfig::default().server_url;
        } else {
            self.server_url = trimmed;
        }
        if let Some(limit) = self.history_limit {
            // The service accepts 1..=100.
            self.history_limit = Some(limit.clamp(1, 100));
        }
    }
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Lattice Labs")
            .join("Scrivo")
            .join("config.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".config")
            })
            .join("scrivo")
            .join("config.json")
    }
}

pub fn load_config(path: &Path) -> AppConfig {
    let mut config = fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<AppConfig>(&raw).ok())
        .unwrap_or_default();
    config.normalize();
    config
}

pub fn save_config(path: &Path, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;
    fs::write(path, json)
}
