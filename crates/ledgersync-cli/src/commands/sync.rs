//! Sync command - guarded bidirectional synchronization
//!
//! Runs one full reconciliation pass: eligibility guards, remote metadata
//! comparison against the cached record, then download, upload, or nothing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use ledgersync_core::config::Config;
use ledgersync_engine::SyncOutcome;

use crate::context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Local ledger file (defaults to the sync-directory copy of the
    /// configured remote file)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl SyncCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let session = context::establish(config, true)?;
        let local = session.resolve_local(self.file.clone())?;

        let outcome = session.reconciler.trigger_synchronization(&local).await?;

        if format.is_json() {
            format.value(&serde_json::json!({
                "outcome": outcome_label(outcome),
                "local": local,
            }));
            return Ok(());
        }

        match outcome {
            SyncOutcome::Disabled => {
                format.warn("Synchronization is disabled. Run 'ledgersync config enable'.");
            }
            SyncOutcome::Downloaded => {
                format.success("Remote copy was newer; downloaded");
                format.info(&format!("Local file: {}", local.display()));
            }
            SyncOutcome::Uploaded => {
                format.success("Local changes uploaded");
            }
            SyncOutcome::UpToDate => {
                format.success("Already up to date");
            }
        }
        Ok(())
    }
}

pub fn outcome_label(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Disabled => "disabled",
        SyncOutcome::Downloaded => "downloaded",
        SyncOutcome::Uploaded => "uploaded",
        SyncOutcome::UpToDate => "up-to-date",
    }
}
