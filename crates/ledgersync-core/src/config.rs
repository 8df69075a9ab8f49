//! Configuration module for ledgersync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, and defaults. Settings that the user can
//! flip at runtime (enabled, wifi-only, remote path) additionally live in the
//! preference store; the config file supplies their initial values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for ledgersync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub sync: SyncSettings,
    pub remote: RemoteSettings,
    pub network: NetworkSettings,
    pub logging: LoggingSettings,
}

/// Synchronization decision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Whether synchronization is enabled at all.
    pub enabled: bool,
    /// Restrict transfers to unmetered networks.
    pub wifi_only: bool,
    /// Schedule a delayed upload as soon as the local file changes.
    pub upload_immediately: bool,
    /// Minutes between periodic full synchronization passes (watch mode).
    pub interval_minutes: u32,
    /// Quiet period after a local change before the coalesced upload fires.
    pub upload_delay_secs: u64,
    /// Directory holding the local copies of remote files.
    pub sync_dir: PathBuf,
}

/// Remote object-store endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the remote store, e.g. `https://storage.example.com/v1`.
    pub base_url: String,
    /// Account name used as the keyring entry for the credential cache.
    pub account: String,
}

/// Network probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Treat the current connection as metered. Meteredness is not
    /// observable from userland on most platforms, so it is declared here
    /// and can be overridden per CLI invocation.
    pub assume_metered: bool,
    /// Timeout for the online probe's TCP connect, in milliseconds.
    pub probe_timeout_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/ledgersync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("ledgersync")
            .join("config.yaml")
    }

    /// Platform-appropriate default path for the preference store file.
    pub fn default_prefs_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgersync")
            .join("preferences.json")
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            wifi_only: false,
            upload_immediately: true,
            interval_minutes: 30,
            upload_delay_secs: 30,
            sync_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ledgersync")
                .join("sync"),
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            account: "default".to_string(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            assume_metered: false,
            probe_timeout_ms: 1500,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
