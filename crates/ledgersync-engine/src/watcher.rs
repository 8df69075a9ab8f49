//! Local ledger file watcher
//!
//! Wraps the `notify` crate to monitor a single file for content changes.
//! The watch is placed on the file's parent directory (non-recursive)
//! because editors commonly save through a temp-file-and-rename sequence
//! that replaces the inode a direct file watch would be pinned to.
//!
//! Raw OS events are filtered down to "the ledger file changed" ticks and
//! sent over an mpsc channel; coalescing bursts into a single upload is the
//! delayed-upload scheduler's job, not the watcher's.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};

/// Watches one local file and reports content changes
///
/// Events for sibling files in the same directory are discarded. The watcher
/// stops when dropped.
pub struct LocalFileWatcher {
    watcher: RecommendedWatcher,
    watched_dir: PathBuf,
}

impl LocalFileWatcher {
    /// Starts watching `file` for changes.
    ///
    /// Returns the watcher and a receiver that yields one tick per observed
    /// change. The file itself does not need to exist yet, but its parent
    /// directory does.
    pub fn watch(file: &Path) -> Result<(Self, mpsc::Receiver<()>)> {
        let file = file.to_path_buf();
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .with_context(|| format!("No parent directory for: {}", file.display()))?;

        let (tx, rx) = mpsc::channel::<()>(64);

        info!(file = %file.display(), "Watching local file for changes");

        let watched = file.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if event_touches_file(&event, &watched) {
                        trace!(kind = ?event.kind, "Local file change observed");
                        if let Err(e) = tx.blocking_send(()) {
                            warn!(error = %e, "Change receiver dropped");
                        }
                    }
                }
                Err(err) => {
                    error!(error = %err, "File watcher error");
                }
            },
            notify::Config::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;

        Ok((
            Self {
                watcher,
                watched_dir: dir,
            },
            rx,
        ))
    }

    /// The directory the underlying watch is placed on
    pub fn watched_dir(&self) -> &Path {
        &self.watched_dir
    }
}

impl Drop for LocalFileWatcher {
    fn drop(&mut self) {
        if let Err(err) = self.watcher.unwatch(&self.watched_dir) {
            trace!(error = %err, "Unwatch on drop failed");
        }
    }
}

/// Whether a raw event represents a content change of the watched file.
///
/// Creates and renames landing on the watched path count as changes (the
/// temp-and-rename save pattern surfaces as either, depending on platform).
/// Removals and access events do not.
fn event_touches_file(event: &notify::Event, file: &Path) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
    );
    if !relevant_kind {
        return false;
    }
    event.paths.iter().any(|p| p == file)
}
