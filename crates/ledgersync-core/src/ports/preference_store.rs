//! Preference store port (driven/secondary port)
//!
//! Durable key-value settings: the sync configuration the user can flip at
//! runtime, the "local file changed" flag, and the cached remote modification
//! record read before every eligibility/conflict check.
//!
//! ## Design Notes
//!
//! - The raw `get`/`set`/`remove`/`clear` surface is the only thing an
//!   adapter must implement; the typed accessors are provided methods built
//!   on top of it, so every adapter gets consistent key naming and parsing.
//! - Timestamps are stored as RFC 3339 strings, the format `DateTime<Utc>`
//!   parses via `FromStr`.
//! - Writes must be durable when `set` returns: the reconciler relies on the
//!   changed flag and the modification cache surviving process restarts.

use chrono::{DateTime, Utc};

/// Well-known preference keys
pub mod keys {
    /// Whether synchronization is enabled
    pub const SYNC_ENABLED: &str = "sync.enabled";
    /// Restrict transfers to unmetered networks
    pub const WIFI_ONLY: &str = "sync.wifi_only";
    /// Schedule a delayed upload as soon as the local file changes
    pub const UPLOAD_IMMEDIATELY: &str = "sync.upload_immediately";
    /// Minutes between periodic synchronization passes
    pub const SYNC_INTERVAL_MINUTES: &str = "sync.interval_minutes";
    /// The configured remote file path
    pub const REMOTE_PATH: &str = "sync.remote_path";
    /// Durable marker that local content differs from the last-synced remote
    pub const LOCAL_CHANGED: &str = "sync.local_changed";

    /// Key under which the last-observed modification time for a remote
    /// path is cached
    pub fn modified_at(remote_path: &str) -> String {
        format!("modified.{remote_path}")
    }
}

/// Port trait for durable key-value preference storage
pub trait IPreferenceStore: Send + Sync {
    /// Returns the raw value for `key`, if set
    fn get(&self, key: &str) -> Option<String>;

    /// Durably sets `key` to `value`
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removes `key`
    fn remove(&self, key: &str) -> anyhow::Result<()>;

    /// Removes every stored preference, including the modification cache
    fn clear(&self) -> anyhow::Result<()>;

    // --- Typed accessors (provided) ---

    /// Whether synchronization is enabled (defaults to false)
    fn is_sync_enabled(&self) -> bool {
        self.get(keys::SYNC_ENABLED).as_deref() == Some("true")
    }

    fn set_sync_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        self.set(keys::SYNC_ENABLED, bool_str(enabled))
    }

    /// Whether transfers are restricted to unmetered networks
    fn wifi_only(&self) -> bool {
        self.get(keys::WIFI_ONLY).as_deref() == Some("true")
    }

    fn set_wifi_only(&self, wifi_only: bool) -> anyhow::Result<()> {
        self.set(keys::WIFI_ONLY, bool_str(wifi_only))
    }

    /// Whether a local change should schedule a delayed upload
    /// (defaults to true)
    fn upload_immediately(&self) -> bool {
        self.get(keys::UPLOAD_IMMEDIATELY).as_deref() != Some("false")
    }

    fn set_upload_immediately(&self, immediately: bool) -> anyhow::Result<()> {
        self.set(keys::UPLOAD_IMMEDIATELY, bool_str(immediately))
    }

    /// Minutes between periodic synchronization passes (defaults to 30)
    fn sync_interval_minutes(&self) -> u32 {
        self.get(keys::SYNC_INTERVAL_MINUTES)
            .and_then(|v| v.parse().ok())
            .unwrap_or(30)
    }

    fn set_sync_interval_minutes(&self, minutes: u32) -> anyhow::Result<()> {
        self.set(keys::SYNC_INTERVAL_MINUTES, &minutes.to_string())
    }

    /// The configured remote file path, if any (empty counts as unset)
    fn remote_path(&self) -> Option<String> {
        self.get(keys::REMOTE_PATH).filter(|p| !p.is_empty())
    }

    fn set_remote_path(&self, path: &str) -> anyhow::Result<()> {
        self.set(keys::REMOTE_PATH, path)
    }

    /// Whether local content differs from the last-synced remote content
    fn local_file_changed(&self) -> bool {
        self.get(keys::LOCAL_CHANGED).as_deref() == Some("true")
    }

    fn set_local_file_changed(&self, changed: bool) -> anyhow::Result<()> {
        self.set(keys::LOCAL_CHANGED, bool_str(changed))
    }

    /// Last-observed modification time for a remote path, if cached
    fn cached_modified_at(&self, remote_path: &str) -> Option<DateTime<Utc>> {
        self.get(&keys::modified_at(remote_path))
            .and_then(|s| s.parse().ok())
    }

    /// Caches the modification time for a remote path.
    ///
    /// Must be called only after a successful upload or download; the
    /// reconciler never writes this speculatively.
    fn set_cached_modified_at(
        &self,
        remote_path: &str,
        modified_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.set(&keys::modified_at(remote_path), &modified_at.to_rfc3339())
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
