//! Delayed-upload scheduler port (driven/secondary port)
//!
//! A cancelable one-shot trigger: arm a timer for a target and, after the
//! delay, the scheduler notifies its consumer that the coalesced upload is
//! due. Replaces platform alarm facilities with a capability any runtime can
//! implement with timers and channels.

use std::time::Duration;

/// Port trait for cancelable one-shot delayed triggers
///
/// ## Invariants
///
/// - At most one pending timer per `target_id`: `arm` for an already-armed
///   target atomically replaces the prior timer (cancel-then-set), it never
///   queues an additional one.
/// - `cancel` for an unknown target is a no-op.
pub trait IUploadScheduler: Send + Sync {
    /// Arms (or re-arms) the one-shot timer for `target_id`
    fn arm(&self, target_id: &str, delay: Duration);

    /// Cancels any pending timer for `target_id`
    fn cancel(&self, target_id: &str);

    /// Returns true if a timer for `target_id` is pending
    fn is_armed(&self, target_id: &str) -> bool;
}
