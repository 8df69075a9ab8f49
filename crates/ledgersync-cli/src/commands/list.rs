//! List command - browse remote folder contents
//!
//! Used to pick the remote ledger file before configuring it with
//! `ledgersync config set-remote`.

use anyhow::Result;
use clap::Args;

use ledgersync_core::config::Config;

use crate::context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Remote folder to list (defaults to the root)
    pub folder: Option<String>,
}

impl ListCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let session = context::establish(config, true)?;
        let folder = self.folder.clone().unwrap_or_default();

        let entries = session.reconciler.list_remote_folder(&folder).await?;

        if format.is_json() {
            format.value(&serde_json::json!(entries));
            return Ok(());
        }

        if entries.is_empty() {
            let shown = if folder.is_empty() { "/" } else { &folder };
            format.warn(&format!("Remote folder '{shown}' is empty"));
            return Ok(());
        }

        for entry in &entries {
            let size = entry
                .size
                .map(|s| format!("{s:>10}"))
                .unwrap_or_else(|| format!("{:>10}", "-"));
            println!(
                "{}  {}  {}",
                entry.modified_at.format("%Y-%m-%d %H:%M:%S"),
                size,
                entry.path
            );
        }
        Ok(())
    }
}
