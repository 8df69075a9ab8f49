//! Domain types for the sync reconciler
//!
//! Pure data types and validation logic with no I/O. Everything the
//! reconciler reasons about lives here: validated paths, sync targets,
//! remote metadata snapshots, and the error taxonomy.

pub mod errors;
pub mod metadata;
pub mod newtypes;

pub use errors::{DomainError, SyncError};
pub use metadata::RemoteMetadata;
pub use newtypes::{file_names_match, RemotePath, SyncTarget};
