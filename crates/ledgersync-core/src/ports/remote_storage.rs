//! Remote storage port (driven/secondary port)
//!
//! This module defines the interface for interacting with the remote object
//! store that holds the synchronized copy of the ledger file. The primary
//! implementation speaks plain HTTP against an object-storage gateway, but
//! the trait is provider-agnostic.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification; the
//!   reconciler maps them onto `SyncError` kinds at its own boundary.
//! - Uses `#[async_trait]` for async trait methods.
//! - `refresh_credential_cache` is synchronous: persisting rotated tokens is
//!   a local operation (keyring write), not a network call.

use crate::domain::{RemoteMetadata, RemotePath};

/// Port trait for remote object-store operations
///
/// ## Implementation Notes
///
/// - `upload` with `overwrite = true` must replace an existing object;
///   with `overwrite = false` it must fail if the object already exists.
/// - Tokens may rotate during long transfers. Implementations should keep
///   the freshest credentials in memory and persist them when
///   `refresh_credential_cache` is called.
#[async_trait::async_trait]
pub trait IRemoteStorage: Send + Sync {
    /// Establishes a session with the remote store
    async fn login(&self) -> anyhow::Result<()>;

    /// Terminates the session and invalidates cached credentials
    async fn logout(&self) -> anyhow::Result<()>;

    /// Lists the files in a remote folder
    ///
    /// # Arguments
    /// * `folder` - Remote folder path; `""` lists the root
    async fn list_contents(&self, folder: &str) -> anyhow::Result<Vec<RemoteMetadata>>;

    /// Retrieves metadata for a single remote file
    async fn get_metadata(&self, path: &RemotePath) -> anyhow::Result<RemoteMetadata>;

    /// Downloads a remote file's content
    async fn download(&self, path: &RemotePath) -> anyhow::Result<Vec<u8>>;

    /// Uploads content to the remote path
    ///
    /// # Arguments
    /// * `path` - Destination path in the remote store
    /// * `data` - File content
    /// * `overwrite` - Whether an existing object may be replaced
    async fn upload(&self, path: &RemotePath, data: &[u8], overwrite: bool) -> anyhow::Result<()>;

    /// Persists any credentials renewed during recent transfers
    fn refresh_credential_cache(&self) -> anyhow::Result<()>;
}
