//! Tokio-based delayed-upload scheduler
//!
//! Implements the cancelable one-shot timer port with a spawned sleep task
//! per armed target. Re-arming cancels the previous task before installing
//! the replacement, so a burst of local changes collapses into a single
//! upload after the quiet period. Due targets are delivered over an mpsc
//! channel for the sync loop to drain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use ledgersync_core::ports::IUploadScheduler;

/// A pending one-shot timer for one target
struct PendingTimer {
    /// Monotonic arm generation, used to detect stale completions
    generation: u64,
    token: CancellationToken,
}

/// Delayed-upload scheduler backed by tokio timers
///
/// Each `arm` spawns a task that sleeps for the delay and then pushes the
/// target id onto the due channel, unless cancelled first. The generation
/// counter guards the map cleanup: a timer that fires concurrently with a
/// re-arm must not remove its successor's entry.
pub struct TokioUploadScheduler {
    pending: Arc<DashMap<String, PendingTimer>>,
    generation: AtomicU64,
    due_tx: mpsc::Sender<String>,
}

impl TokioUploadScheduler {
    /// Creates a scheduler and the receiving end of its due channel
    pub fn new() -> (Self, mpsc::Receiver<String>) {
        let (due_tx, due_rx) = mpsc::channel(16);
        let scheduler = Self {
            pending: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            due_tx,
        };
        (scheduler, due_rx)
    }
}

impl IUploadScheduler for TokioUploadScheduler {
    fn arm(&self, target_id: &str, delay: Duration) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        // Cancel-then-set: the prior timer (if any) must never fire once a
        // replacement is installed.
        if let Some(prior) = self.pending.insert(
            target_id.to_string(),
            PendingTimer {
                generation,
                token: token.clone(),
            },
        ) {
            prior.token.cancel();
            trace!(target_id, "Replaced pending delayed upload");
        } else {
            debug!(target_id, ?delay, "Armed delayed upload");
        }

        let pending = Arc::clone(&self.pending);
        let due_tx = self.due_tx.clone();
        let target = target_id.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(target_id = %target, "Delayed upload cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    // Only the still-current generation may clean up and fire.
                    let current = pending
                        .remove_if(&target, |_, timer| timer.generation == generation)
                        .is_some();
                    if current {
                        debug!(target_id = %target, "Delayed upload due");
                        let _ = due_tx.send(target).await;
                    }
                }
            }
        });
    }

    fn cancel(&self, target_id: &str) {
        if let Some((_, timer)) = self.pending.remove(target_id) {
            timer.token.cancel();
            debug!(target_id, "Cancelled pending delayed upload");
        }
    }

    fn is_armed(&self, target_id: &str) -> bool {
        self.pending.contains_key(target_id)
    }
}
