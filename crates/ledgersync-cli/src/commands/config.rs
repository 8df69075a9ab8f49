//! Config commands - view and change sync preferences
//!
//! Preference writes go straight to the durable store; no gateway wiring is
//! needed except for `reset`, which also re-persists credentials after the
//! store is cleared.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use ledgersync_core::config::Config;
use ledgersync_core::domain::RemotePath;
use ledgersync_core::ports::IPreferenceStore;
use ledgersync_store::JsonPreferenceStore;

use crate::context;
use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current preferences
    Show,
    /// Enable synchronization
    Enable,
    /// Disable synchronization
    Disable,
    /// Set the remote file path
    SetRemote(SetRemoteArgs),
    /// Restrict transfers to unmetered networks
    WifiOnly(WifiOnlyArgs),
    /// Set the periodic sync interval in minutes
    SetInterval(SetIntervalArgs),
    /// Clear all sync preferences, including the modification cache
    Reset,
}

#[derive(Debug, Args)]
pub struct SetRemoteArgs {
    /// Remote file path, e.g. Sync/budget.mmb
    pub path: String,
}

#[derive(Debug, Args)]
pub struct WifiOnlyArgs {
    /// `true` to restrict, `false` to allow metered networks
    pub enabled: bool,
}

#[derive(Debug, Args)]
pub struct SetIntervalArgs {
    /// Minutes between periodic synchronization passes
    pub minutes: u32,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let prefs = JsonPreferenceStore::open(Config::default_prefs_path())
            .context("Failed to open preference store")?;

        match self {
            ConfigCommand::Show => show(&prefs, format),
            ConfigCommand::Enable => {
                prefs.set_sync_enabled(true)?;
                format.success("Synchronization enabled");
                Ok(())
            }
            ConfigCommand::Disable => {
                prefs.set_sync_enabled(false)?;
                format.success("Synchronization disabled");
                Ok(())
            }
            ConfigCommand::SetRemote(args) => {
                let validated = RemotePath::new(args.path.as_str())?;
                prefs.set_remote_path(validated.as_str())?;
                format.success(&format!("Remote path set to {validated}"));
                Ok(())
            }
            ConfigCommand::WifiOnly(args) => {
                prefs.set_wifi_only(args.enabled)?;
                format.success(&format!(
                    "Transfers {} restricted to unmetered networks",
                    if args.enabled { "now" } else { "no longer" }
                ));
                Ok(())
            }
            ConfigCommand::SetInterval(args) => {
                prefs.set_sync_interval_minutes(args.minutes)?;
                format.success(&format!("Sync interval set to {} minutes", args.minutes));
                Ok(())
            }
            ConfigCommand::Reset => {
                // Reset goes through the reconciler so credentials are
                // re-persisted after the store is wiped.
                drop(prefs);
                let session = context::establish(config, false)?;
                session.reconciler.reset_preferences()?;
                format.success("Preferences reset");
                Ok(())
            }
        }
    }
}

fn show(prefs: &JsonPreferenceStore, format: OutputFormat) -> Result<()> {
    let remote_path = prefs.remote_path();

    if format.is_json() {
        format.value(&serde_json::json!({
            "enabled": prefs.is_sync_enabled(),
            "wifi_only": prefs.wifi_only(),
            "upload_immediately": prefs.upload_immediately(),
            "interval_minutes": prefs.sync_interval_minutes(),
            "remote_path": remote_path,
        }));
        return Ok(());
    }

    println!("enabled            = {}", prefs.is_sync_enabled());
    println!("wifi_only          = {}", prefs.wifi_only());
    println!("upload_immediately = {}", prefs.upload_immediately());
    println!("interval_minutes   = {}", prefs.sync_interval_minutes());
    println!(
        "remote_path        = {}",
        remote_path.as_deref().unwrap_or("(unset)")
    );
    Ok(())
}
