//! Watch command - continuous synchronization
//!
//! Runs three loops in one select:
//! - local file changes feed `on_local_change`, arming coalesced uploads
//! - due delayed uploads from the scheduler channel run the upload path
//! - a periodic timer runs a full guarded synchronization pass
//!
//! Ctrl-C exits cleanly.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use ledgersync_core::config::Config;
use ledgersync_core::domain::SyncError;
use ledgersync_core::ports::{IPreferenceStore, IUploadScheduler};
use ledgersync_engine::{LocalFileWatcher, SyncOutcome};

use crate::commands::sync::outcome_label;
use crate::context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Local ledger file to watch (defaults to the sync-directory copy)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl WatchCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let session = context::establish(config, true)?;
        let local = session.resolve_local(self.file.clone())?;

        let context::Session {
            prefs,
            reconciler,
            scheduler,
            mut due,
        } = session;

        let (_watcher, mut changes) = LocalFileWatcher::watch(&local)?;

        let interval_minutes = prefs.sync_interval_minutes().max(1);
        let mut periodic =
            tokio::time::interval(Duration::from_secs(u64::from(interval_minutes) * 60));
        periodic.set_missed_tick_behavior(MissedTickBehavior::Delay);

        format.success(&format!(
            "Watching {} (full pass every {interval_minutes} min, Ctrl-C to stop)",
            local.display()
        ));

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    format.info("Stopping");
                    break;
                }

                Some(()) = changes.recv() => {
                    if let Err(err) = reconciler.on_local_change() {
                        warn!(error = %err, "Failed to record local change");
                    }
                }

                Some(target) = due.recv() => {
                    match reconciler.trigger_upload(&local).await {
                        Ok(SyncOutcome::Uploaded) => {
                            format.success("Local changes uploaded");
                        }
                        Ok(_) => {}
                        Err(SyncError::TransferInFlight) => {
                            // Another transfer owns the slot; try again
                            // after a fresh quiet period.
                            scheduler.arm(&target, Duration::from_secs(config.sync.upload_delay_secs));
                        }
                        Err(err) if err.is_recoverable() => {
                            format.warn(&format!("Upload failed, will retry: {err}"));
                        }
                        Err(err) => {
                            format.error(&err.to_string());
                            return Err(err.into());
                        }
                    }
                }

                _ = periodic.tick() => {
                    match reconciler.trigger_synchronization(&local).await {
                        Ok(SyncOutcome::UpToDate) | Ok(SyncOutcome::Disabled) => {}
                        Ok(outcome) => {
                            format.success(&format!("Periodic pass: {}", outcome_label(outcome)));
                        }
                        Err(err) if err.is_recoverable() => {
                            format.warn(&format!("Periodic pass failed: {err}"));
                        }
                        Err(err) => {
                            format.error(&err.to_string());
                            return Err(err.into());
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
