//! Client-local key/value preferences
//!
//! Only one key is used today (`selectedModel`), but the store is a plain
//! string map so the file format stays stable if more are added.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Key under which the last selected model is stored
pub const SELECTED_MODEL_KEY: &str = "selectedModel";

/// Model used when nothing was ever selected
pub const DEFAULT_MODEL: &str = "gemma3:1b";

/// Persistent string key/value storage
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value; implementations persist before returning
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Read the persisted model, falling back to `fallback` when absent or blank
pub fn load_selected_model(store: &dyn PreferenceStore, fallback: &str) -> String {
    store
        .get(SELECTED_MODEL_KEY)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

// ============================================================================
// File-backed store
// ============================================================================

/// Preferences kept in a small JSON object on disk
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    /// `<config dir>/ollama-chat/preferences.json`, or a dot-directory in the
    /// CWD when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("ollama-chat"))
            .unwrap_or_else(|| PathBuf::from(".ollama-chat"))
            .join("preferences.json")
    }

    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => {
                debug!("No preferences at {}, starting empty", path.display());
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("Cannot write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Cannot replace {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Volatile preferences. Clones share the same map, which lets tests
/// simulate a restart by handing a clone to a fresh app.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("preference map poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_when_empty() {
        let store = MemoryPreferences::new();
        assert_eq!(load_selected_model(&store, DEFAULT_MODEL), "gemma3:1b");
    }

    #[test]
    fn test_blank_value_falls_back() {
        let mut store = MemoryPreferences::new();
        store.set(SELECTED_MODEL_KEY, "  ").unwrap();
        assert_eq!(load_selected_model(&store, "fallback"), "fallback");
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut store = FilePreferences::open(&path);
        assert_eq!(load_selected_model(&store, DEFAULT_MODEL), DEFAULT_MODEL);
        store.set(SELECTED_MODEL_KEY, "llama3:8b").unwrap();

        let reopened = FilePreferences::open(&path);
        assert_eq!(load_selected_model(&reopened, DEFAULT_MODEL), "llama3:8b");
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FilePreferences::open(&path);
        assert!(store.get(SELECTED_MODEL_KEY).is_none());
    }

    #[test]
    fn test_memory_clones_share_values() {
        let mut store = MemoryPreferences::new();
        let other = store.clone();
        store.set(SELECTED_MODEL_KEY, "m").unwrap();
        assert_eq!(other.get(SELECTED_MODEL_KEY).as_deref(), Some("m"));
    }
}
