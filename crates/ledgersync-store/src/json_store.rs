//! JSON file-backed preference store
//!
//! The whole store is one JSON object of string keys and string values.
//! Every mutation rewrites the file via write-to-temp + rename in the same
//! directory, so readers never observe a partial write.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use ledgersync_core::ports::IPreferenceStore;

/// File-backed implementation of the `IPreferenceStore` port
///
/// The in-memory map is the source of truth for reads; the file is rewritten
/// on every mutation. A `BTreeMap` keeps the on-disk JSON stable and
/// diff-friendly.
pub struct JsonPreferenceStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonPreferenceStore {
    /// Opens the store at `path`, loading existing entries if the file exists
    ///
    /// The parent directory is created if necessary. A missing file is an
    /// empty store, not an error; an unreadable or corrupt file is an error
    /// so the caller doesn't silently lose settings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Corrupt preference file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), "Opened preference store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;

        // Write to a temporary file in the same directory so rename is atomic.
        let tmp_path = {
            let mut p = self.path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };

        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to rename into: {}", self.path.display()))?;

        Ok(())
    }
}

impl IPreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().expect("prefs lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().expect("prefs lock poisoned");
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(err) = self.persist(&entries) {
            // Roll back the in-memory change so memory and disk stay consistent.
            match previous {
                Some(old) => {
                    entries.insert(key.to_string(), old);
                }
                None => {
                    entries.remove(key);
                }
            }
            warn!(key, error = %err, "Failed to persist preference");
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().expect("prefs lock poisoned");
        let previous = entries.remove(key);
        if let Err(err) = self.persist(&entries) {
            if let Some(old) = previous {
                entries.insert(key.to_string(), old);
            }
            return Err(err);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().expect("prefs lock poisoned");
        let previous = std::mem::take(&mut *entries);
        if let Err(err) = self.persist(&entries) {
            *entries = previous;
            return Err(err);
        }
        debug!(path = %self.path.display(), "Cleared preference store");
        Ok(())
    }
}
