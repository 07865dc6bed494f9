use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::defaults::{CONFIG_DIR_NAME, PREFERENCES_FILE_NAME};
use super::Preferences;
use crate::error::{LiveError, Result};

/// Source of connection preferences
///
/// Sources ask on every connect and every reconnect attempt; `None` means
/// no usable configuration right now, which puts the source into
/// `ConnectionStatus::Error`.
pub trait ConfigProvider: Send + Sync {
    fn preferences(&self) -> Option<Preferences>;
}

/// In-memory preferences that can be swapped at runtime
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    inner: Arc<RwLock<Option<Preferences>>>,
}

impl StaticConfig {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(preferences))),
        }
    }

    /// A provider with nothing configured
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set(&self, preferences: Option<Preferences>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = preferences,
            Err(poisoned) => *poisoned.into_inner() = preferences,
        }
    }
}

impl ConfigProvider for StaticConfig {
    fn preferences(&self) -> Option<Preferences> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Preferences read from a JSON file on every lookup
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Provider for the platform default location.
    ///
    /// Fails with `ConfigUnavailable` on platforms without a config directory.
    pub fn from_default_location() -> Result<Self> {
        default_preferences_path()
            .map(Self::new)
            .ok_or(LiveError::ConfigUnavailable)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file, reporting why it failed
    pub fn load(&self) -> Result<Preferences> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            LiveError::Config(format!("Failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            LiveError::Config(format!("Failed to parse {}: {e}", self.path.display()))
        })
    }
}

impl ConfigProvider for FileConfig {
    fn preferences(&self) -> Option<Preferences> {
        match self.load() {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                tracing::warn!("Preferences unavailable: {}", e);
                None
            }
        }
    }
}

/// `<config dir>/livefeed/preferences.json`
fn default_preferences_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(PREFERENCES_FILE_NAME))
}
