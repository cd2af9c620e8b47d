//! Persisted key/value settings.
//!
//! The connection toggle reads the server URL and access key from here on
//! every connect, so values written by `settings set` take effect on the next
//! connection without restarting.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Settings key holding the automation server base URL.
pub const KEY_SERVER_URL: &str = "serverUrl";
/// Settings key holding the access key.
pub const KEY_VCP_KEY: &str = "vcpKey";

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8088";
pub const DEFAULT_VCP_KEY: &str = "your_secret_key";

/// Key/value settings storage.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;

    fn remove(&self, key: &str) -> Result<Option<String>, ConfigError>;

    /// All entries, sorted by key.
    fn list(&self) -> Vec<(String, String)>;

    /// Stored server URL, or the built-in default.
    fn server_url(&self) -> String {
        self.get(KEY_SERVER_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    /// Stored access key, or the built-in default.
    fn vcp_key(&self) -> String {
        self.get(KEY_VCP_KEY)
            .unwrap_or_else(|| DEFAULT_VCP_KEY.to_string())
    }
}

/// Volatile settings, used by tests and `--no-persist` style runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries.write().insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.entries.write().remove(key))
    }

    fn list(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Settings persisted as a flat JSON object on disk.
///
/// The whole file is cached in memory and rewritten on every change.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileSettingsStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    ConfigError::InvalidFormat(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Loaded {} settings from {:?}", entries.len(), path);

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Open the store at `~/.vcp-bridge/settings.json`.
    pub fn default_path() -> Result<Self, ConfigError> {
        Self::open(Self::default_location()?)
    }

    pub fn default_location() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Settings("home directory not found".to_string()))?;
        Ok(home.join(".vcp-bridge").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                info!("Created settings directory: {:?}", parent);
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let mut entries = self.entries.write();
        let removed = entries.remove(key);
        if removed.is_some() {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    fn list(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
