//! Ledgersync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemotePath`, `SyncTarget`, `RemoteMetadata`, `SyncError`
//! - **Configuration** - typed YAML configuration with defaults
//! - **Port definitions** - Traits for adapters: `IRemoteStorage`,
//!   `IPreferenceStore`, `INetworkProbe`, `IUploadScheduler`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement. The reconciler
//! in `ledgersync-engine` orchestrates domain types through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
