//! Ledgersync Remote - HTTP object-storage adapter
//!
//! Implements the `IRemoteStorage` port against a plain HTTP object-storage
//! gateway:
//!
//! - `HEAD /files/{path}` - metadata (`Last-Modified`, `Content-Length`)
//! - `GET /files/{path}` - download
//! - `PUT /files/{path}` - upload (`If-None-Match: *` when overwrite is off)
//! - `GET /list/{folder}` - JSON folder listing
//!
//! Tokens may rotate mid-session: the gateway returns a replacement in the
//! `X-Renewed-Token` response header, which the client keeps in memory until
//! `refresh_credential_cache` persists it to the system keyring.
//!
//! ## Modules
//!
//! - [`client`] - Authenticated `reqwest` wrapper
//! - [`provider`] - The `IRemoteStorage` implementation
//! - [`credentials`] - Keyring-backed credential cache
//! - [`probe`] - TCP connectivity probe

pub mod client;
pub mod credentials;
pub mod probe;
pub mod provider;

pub use client::HttpStorageClient;
pub use credentials::{CredentialCache, KeyringCredentialCache};
pub use probe::TcpNetworkProbe;
pub use provider::HttpRemoteStorage;
