//! Ledgersync Engine - sync reconciliation
//!
//! Decides whether synchronization may run and which direction content
//! should flow between the local ledger file and its remote copy.
//!
//! ## Modules
//!
//! - [`reconciler`] - Eligibility decisions and upload/download reconciliation
//! - [`scheduler`] - Coalescing cancelable one-shot delayed-upload timers
//! - [`watcher`] - Local file watcher feeding change notifications

pub mod reconciler;
pub mod scheduler;
pub mod watcher;

pub use reconciler::{Reconciler, SyncOutcome};
pub use scheduler::TokioUploadScheduler;
pub use watcher::LocalFileWatcher;
