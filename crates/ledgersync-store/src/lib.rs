//! Ledgersync Store - durable preference storage
//!
//! Provides [`JsonPreferenceStore`], a file-backed implementation of the
//! `IPreferenceStore` port. Preferences are held as a flat string-to-string
//! map persisted as pretty-printed JSON, written atomically so a crash can
//! never leave a half-written store behind.

mod json_store;

pub use json_store::JsonPreferenceStore;
