//! Domain error types
//!
//! Two layers of errors live here:
//! - [`DomainError`] for validation failures when constructing domain types.
//! - [`SyncError`] for the outcome of reconciliation operations. Each guard
//!   in the reconciler surfaces a distinct kind so the caller can present a
//!   specific, actionable reason instead of a generic failure.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when constructing or validating domain types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote path format (empty, or no file name component)
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// Invalid local path
    #[error("Invalid local path: {0}")]
    InvalidLocalPath(String),
}

/// Errors surfaced by reconciliation operations
///
/// All kinds are recoverable by retrying except [`FilenameMismatch`], which
/// requires the user to reconfigure the remote slot. Transfer-level failures
/// (`TransferFailed`, `MetadataFetchFailed`) guarantee that no durable state
/// (modification cache, changed flag) was touched, so a retry is always safe.
///
/// [`FilenameMismatch`]: SyncError::FilenameMismatch
#[derive(Debug, Error)]
pub enum SyncError {
    /// No remote path has been configured
    #[error("No remote file is configured; set a remote path first")]
    NotConfigured,

    /// The network is not reachable
    #[error("Network is offline")]
    Offline,

    /// Sync is restricted to unmetered networks and the current one is metered
    #[error("Sync is restricted to unmetered networks; current network is metered")]
    WifiRequired,

    /// The local file to upload does not exist or could not be opened
    #[error("Local file missing or unreadable: {0}")]
    LocalFileMissing(PathBuf),

    /// Local and remote base file names differ; bidirectional sync refused
    #[error("Local file '{local}' does not match configured remote file '{remote}'")]
    FilenameMismatch {
        /// Base name of the local file
        local: String,
        /// Base name of the configured remote file
        remote: String,
    },

    /// I/O error during an upload or download transfer
    #[error("Transfer failed: {0}")]
    TransferFailed(#[source] anyhow::Error),

    /// The transfer completed but the confirming metadata fetch did not
    #[error("Metadata fetch after transfer failed: {0}")]
    MetadataFetchFailed(#[source] anyhow::Error),

    /// Login or token failure against the remote store
    #[error("Credential error: {0}")]
    CredentialError(#[source] anyhow::Error),

    /// An explicit trigger arrived while a transfer for the same target was running
    #[error("A transfer for this target is already in flight")]
    TransferInFlight,

    /// Domain validation failure propagated from type construction
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl SyncError {
    /// Returns true if the caller can recover by retrying the operation.
    ///
    /// `FilenameMismatch` is the only non-recoverable kind: it signals a
    /// configuration problem that no amount of retrying will fix.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::FilenameMismatch { .. })
    }
}
