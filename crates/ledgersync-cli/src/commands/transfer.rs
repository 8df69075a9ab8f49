//! Upload / download commands - explicit, user-directed transfers
//!
//! These skip the basename safety check that guards the bidirectional sync
//! pass; the user named the direction explicitly. They still honor the
//! eligibility guards and the one-transfer-per-target rule.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use ledgersync_core::config::Config;
use ledgersync_engine::SyncOutcome;

use crate::context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local ledger file to upload (defaults to the sync-directory copy)
    pub file: Option<PathBuf>,
}

impl UploadCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let session = context::establish(config, true)?;
        let local = session.resolve_local(self.file.clone())?;

        match session.reconciler.trigger_upload(&local).await? {
            SyncOutcome::Disabled => {
                format.warn("Synchronization is disabled. Run 'ledgersync config enable'.");
            }
            _ if format.is_json() => {
                format.value(&serde_json::json!({ "uploaded": local }));
            }
            _ => {
                format.success(&format!("Uploaded {}", local.display()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct DownloadCommand {}

impl DownloadCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let session = context::establish(config, true)?;

        match session.reconciler.trigger_download().await? {
            SyncOutcome::Disabled => {
                format.warn("Synchronization is disabled. Run 'ledgersync config enable'.");
            }
            _ => {
                let local = session.resolve_local(None)?;
                if format.is_json() {
                    format.value(&serde_json::json!({ "downloaded": local }));
                } else {
                    format.success(&format!("Downloaded to {}", local.display()));
                }
            }
        }
        Ok(())
    }
}
