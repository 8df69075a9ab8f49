//! Validated newtypes for sync paths and targets
//!
//! `RemotePath` guarantees a non-empty path with a file name component.
//! `SyncTarget` pairs a local file with its remote counterpart and carries
//! the identity used for per-target coordination (in-flight guards, armed
//! delayed-upload timers).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RemotePath
// ============================================================================

/// A validated path in the remote object store
///
/// Invariants:
/// - Non-empty
/// - Has a final path segment (the file name)
///
/// Remote paths always use `/` as the separator, independent of the local
/// platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemotePath(String);

impl RemotePath {
    /// Creates a new `RemotePath`, validating the invariants
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(DomainError::InvalidRemotePath(path));
        }
        if path.ends_with('/') {
            return Err(DomainError::InvalidRemotePath(path));
        }
        Ok(Self(path))
    }

    /// Returns the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the base file name (final path segment)
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the parent folder, or `""` for a root-level file
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SyncTarget
// ============================================================================

/// A (local path, remote path) pair under synchronization
///
/// The local path is conventionally derived from the remote base name joined
/// to the local sync directory, but an explicitly opened local file is also
/// valid; the reconciler's filename guard catches mismatched pairs before a
/// bidirectional sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    local: PathBuf,
    remote: RemotePath,
}

impl SyncTarget {
    /// Creates a target from an explicit local path and remote path
    pub fn new(local: impl Into<PathBuf>, remote: RemotePath) -> Self {
        Self {
            local: local.into(),
            remote,
        }
    }

    /// Creates a target whose local path is derived from the remote base
    /// name joined to `sync_dir`
    pub fn in_sync_dir(sync_dir: &Path, remote: RemotePath) -> Self {
        let local = sync_dir.join(remote.file_name());
        Self { local, remote }
    }

    /// The local file path
    pub fn local(&self) -> &Path {
        &self.local
    }

    /// The remote file path
    pub fn remote(&self) -> &RemotePath {
        &self.remote
    }

    /// Stable identity for per-target coordination.
    ///
    /// Two targets with the same remote path are the same logical target:
    /// the remote slot is what must never see concurrent transfers.
    pub fn id(&self) -> &str {
        self.remote.as_str()
    }
}

// ============================================================================
// Filename safety check
// ============================================================================

/// Compares the base file names of a local and a remote path,
/// case-insensitively.
///
/// Used as a safety check before a bidirectional synchronize: it prevents
/// accidentally overwriting an unrelated file that happens to occupy the
/// configured remote slot. Explicit, user-directed uploads and downloads
/// skip this guard.
pub fn file_names_match(local: &Path, remote: &RemotePath) -> bool {
    let Some(local_name) = local.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    local_name.eq_ignore_ascii_case(remote.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_path_rejects_empty() {
        assert!(RemotePath::new("").is_err());
        assert!(RemotePath::new("   ").is_err());
    }

    #[test]
    fn test_remote_path_rejects_trailing_slash() {
        assert!(RemotePath::new("Sync/").is_err());
    }

    #[test]
    fn test_remote_path_file_name() {
        let path = RemotePath::new("Sync/budget.mmb").unwrap();
        assert_eq!(path.file_name(), "budget.mmb");

        let root = RemotePath::new("budget.mmb").unwrap();
        assert_eq!(root.file_name(), "budget.mmb");
    }

    #[test]
    fn test_remote_path_parent() {
        let path = RemotePath::new("Apps/Sync/budget.mmb").unwrap();
        assert_eq!(path.parent(), "Apps/Sync");

        let root = RemotePath::new("budget.mmb").unwrap();
        assert_eq!(root.parent(), "");
    }

    #[test]
    fn test_target_in_sync_dir_derives_local_name() {
        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        let target = SyncTarget::in_sync_dir(Path::new("/data/ledgersync/sync"), remote);
        assert_eq!(
            target.local(),
            Path::new("/data/ledgersync/sync/budget.mmb")
        );
    }

    #[test]
    fn test_target_id_is_remote_path() {
        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        let target = SyncTarget::new("/tmp/budget.mmb", remote);
        assert_eq!(target.id(), "Sync/budget.mmb");
    }

    #[test]
    fn test_file_names_match_case_insensitive() {
        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        assert!(file_names_match(Path::new("/home/u/budget.mmb"), &remote));
        assert!(file_names_match(Path::new("/home/u/BUDGET.MMB"), &remote));
    }

    #[test]
    fn test_file_names_match_rejects_different_names() {
        let remote = RemotePath::new("Sync/other.mmb").unwrap();
        assert!(!file_names_match(Path::new("/home/u/budget.mmb"), &remote));
    }

    #[test]
    fn test_file_names_match_rejects_pathless_local() {
        let remote = RemotePath::new("budget.mmb").unwrap();
        assert!(!file_names_match(Path::new("/"), &remote));
    }
}
