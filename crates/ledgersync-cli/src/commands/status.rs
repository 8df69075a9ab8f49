//! Status command - sync state and eligibility at a glance
//!
//! Works without stored credentials: eligibility checks and preference
//! reads never touch the gateway beyond the TCP reachability probe.

use anyhow::Result;
use clap::Args;

use ledgersync_core::config::Config;
use ledgersync_core::ports::IPreferenceStore;

use crate::context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let session = context::establish(config, false)?;
        let prefs = &session.prefs;
        let reconciler = &session.reconciler;

        let remote_path = prefs.remote_path();
        let local_changed = prefs.local_file_changed();
        let cached_modified = remote_path
            .as_deref()
            .and_then(|p| prefs.cached_modified_at(p));
        let can_sync = reconciler.can_sync();
        let is_active = reconciler.is_active();

        if format.is_json() {
            format.value(&serde_json::json!({
                "enabled": prefs.is_sync_enabled(),
                "wifi_only": prefs.wifi_only(),
                "upload_immediately": prefs.upload_immediately(),
                "interval_minutes": prefs.sync_interval_minutes(),
                "remote_path": remote_path,
                "local_file": reconciler.local_path_for_remote(),
                "local_changed": local_changed,
                "cached_modified_at": cached_modified,
                "can_sync": can_sync,
                "is_active": is_active,
            }));
            return Ok(());
        }

        println!("Synchronization status");
        println!("  Enabled:            {}", onoff(prefs.is_sync_enabled()));
        println!("  Wifi-only:          {}", onoff(prefs.wifi_only()));
        println!("  Upload immediately: {}", onoff(prefs.upload_immediately()));
        println!("  Interval:           {} min", prefs.sync_interval_minutes());
        println!(
            "  Remote path:        {}",
            remote_path.as_deref().unwrap_or("(not configured)")
        );
        if let Some(local) = reconciler.local_path_for_remote() {
            println!("  Local file:         {}", local.display());
        }
        println!("  Local changed:      {}", yesno(local_changed));
        match cached_modified {
            Some(at) => println!("  Last synced remote: {}", at.to_rfc3339()),
            None => println!("  Last synced remote: (never)"),
        }
        println!();
        println!("  Eligible (auto):    {}", yesno(can_sync));
        println!("  Eligible (manual):  {}", yesno(is_active));

        Ok(())
    }
}

fn onoff(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn yesno(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
