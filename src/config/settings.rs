//! Application settings from config.toml.
//!
//! Every section and key is optional; a missing file is an error only when a path is
//! given explicitly.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// The whole config.toml file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sync engine tuning
    pub sync: SyncSettings,
    /// Session to start with
    pub session: SessionSettings,
}

/// `[sync]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Seconds between cloud reachability probes
    pub probe_interval_secs: u64,
    /// Milliseconds the final migration progress stays visible
    pub progress_clear_delay_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            probe_interval_secs: 15,
            progress_clear_delay_ms: 3000,
        }
    }
}

impl SyncSettings {
    /// Probe interval as a `Duration`; never zero.
    #[must_use]
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    /// Progress clear delay as a `Duration`.
    #[must_use]
    pub const fn progress_clear_delay(&self) -> Duration {
        Duration::from_millis(self.progress_clear_delay_ms)
    }
}

/// `[session]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Cloud user signed in at startup; absent means signed out
    pub user_id: Option<String>,
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads ./config.toml, falling back to defaults when it does not exist.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        Ok(AppConfig::default())
    }
}
