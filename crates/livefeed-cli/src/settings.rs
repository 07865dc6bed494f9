//! Preferences for the CLI: a preferences file with command-line overrides

use livefeed_core::config::{ConfigProvider, FileConfig, Preferences};
use std::path::PathBuf;

/// Values given on the command line, applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub reconnect_delay_ms: Option<u64>,
}

impl Overrides {
    fn apply(&self, mut prefs: Preferences) -> Preferences {
        if let Some(address) = &self.address {
            prefs.robot_address = address.clone();
        }
        if let Some(port) = self.port {
            prefs.port = port;
        }
        if let Some(delay) = self.reconnect_delay_ms {
            prefs.reconnect_delay_ms = delay;
        }
        prefs
    }
}

/// Config provider used by the CLI
///
/// With an explicit file, a missing or broken file means "unavailable" and
/// the source goes to `Error`. Without one, the platform default file is used
/// if it exists, otherwise built-in defaults.
#[derive(Debug, Clone)]
pub struct CliConfig {
    file: Option<FileConfig>,
    overrides: Overrides,
}

impl CliConfig {
    pub fn new(file: Option<PathBuf>, overrides: Overrides) -> Self {
        let file = match file {
            Some(path) => Some(FileConfig::new(path)),
            None => FileConfig::from_default_location()
                .map_err(|e| tracing::debug!("No default preferences file: {}", e))
                .ok()
                .filter(|config| config.path().exists()),
        };
        Self { file, overrides }
    }

    pub fn file(&self) -> Option<&FileConfig> {
        self.file.as_ref()
    }
}

impl ConfigProvider for CliConfig {
    fn preferences(&self) -> Option<Preferences> {
        let base = match &self.file {
            Some(file) => file.preferences()?,
            None => Preferences::default(),
        };
        Some(self.overrides.apply(base))
    }
}
