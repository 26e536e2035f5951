//! Ollama Chat Client
//!
//! A terminal client for a chat backend that exposes:
//! - Session CRUD over plain REST (`/sessions/`)
//! - Message history and sending (`/msgs/{id}`), with the assistant reply
//!   streamed back as a raw text body
//!
//! The library holds the client core (stores, transport, reply streaming,
//! the `App` view binder); the `chat` binary adds the CLI and the REPL.

pub mod app;
pub mod dialog;
pub mod models;
pub mod prefs;
pub mod repl;
pub mod store;
pub mod stream;
pub mod transport;
pub mod view;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub chat: ChatYamlConfig,
}

/// Backend connection section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub url: String,
    /// Bound on connection setup only; streamed replies are never cut short
    pub connect_timeout_secs: Option<u64>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".into(),
            connect_timeout_secs: None,
        }
    }
}

/// Chat behaviour section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ChatYamlConfig {
    /// Model used until the user picks one
    pub default_model: Option<String>,
    /// Where the selected model is remembered
    pub preferences_path: Option<String>,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub connect_timeout: Option<Duration>,
    pub default_model: String,
    pub preferences_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries [`Config::default_yaml_path`]. A missing
    /// file falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let default_path = Self::default_yaml_path();
        let yaml = Self::load_yaml(yaml_path.unwrap_or(&default_path));

        // 2. Build Config with env var overrides
        let connect_timeout_secs = std::env::var("CHAT_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(yaml.server.connect_timeout_secs);

        Ok(Self {
            server_url: std::env::var("CHAT_SERVER_URL").unwrap_or(yaml.server.url),
            connect_timeout: connect_timeout_secs.map(Duration::from_secs),
            default_model: std::env::var("CHAT_DEFAULT_MODEL")
                .ok()
                .or(yaml.chat.default_model)
                .unwrap_or_else(|| prefs::DEFAULT_MODEL.to_string()),
            preferences_path: std::env::var("CHAT_PREFERENCES_PATH")
                .ok()
                .or(yaml.chat.preferences_path)
                .map(|p| expand_tilde(&p))
                .unwrap_or_else(prefs::FilePreferences::default_path),
        })
    }

    /// `config.yaml` in the CWD if present, else `<config dir>/ollama-chat/config.yaml`
    pub fn default_yaml_path() -> PathBuf {
        let local = PathBuf::from("config.yaml");
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join("ollama-chat").join("config.yaml"))
            .unwrap_or(local)
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(path: &Path) -> YamlConfig {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

// ============================================================================
// Tests
// ============================================================================
