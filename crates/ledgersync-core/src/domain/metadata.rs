//! Remote file metadata snapshot
//!
//! `RemoteMetadata` is a port-level DTO owned by the remote storage adapter;
//! the reconciler references it by value and never mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable snapshot of a remote file's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMetadata {
    /// Full path of the file in the remote store
    pub path: String,
    /// Last modification time reported by the remote store
    pub modified_at: DateTime<Utc>,
    /// File size in bytes, when the remote store reports it
    pub size: Option<u64>,
}
