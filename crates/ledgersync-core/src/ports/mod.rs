//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the reconciler depends
//! on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStorage`] - Remote object-store operations (list, metadata, transfer)
//! - [`IPreferenceStore`] - Durable key-value settings and the modification cache
//! - [`INetworkProbe`] - Connectivity and meteredness checks
//! - [`IUploadScheduler`] - Cancelable one-shot delayed-upload timers

pub mod network_probe;
pub mod preference_store;
pub mod remote_storage;
pub mod scheduler;

pub use network_probe::INetworkProbe;
pub use preference_store::{keys, IPreferenceStore};
pub use remote_storage::IRemoteStorage;
pub use scheduler::IUploadScheduler;
