//! Ledgersync CLI - remote ledger-file synchronization
//!
//! Provides commands for:
//! - Logging in to and out of the remote storage gateway
//! - Running guarded synchronization passes
//! - Explicit uploads and downloads
//! - Inspecting sync status and eligibility
//! - Managing sync preferences
//! - Watching the local ledger file for changes

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;

use commands::{
    auth::AuthCommand,
    config::ConfigCommand,
    list::ListCommand,
    status::StatusCommand,
    sync::SyncCommand,
    transfer::{DownloadCommand, UploadCommand},
    watch::WatchCommand,
};
use ledgersync_core::config::Config;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "ledgersync", version, about = "Keep a ledger file in sync with remote storage")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat the current network as metered for this invocation
    #[arg(long, global = true)]
    metered: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage gateway credentials
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Run a guarded bidirectional synchronization pass
    Sync(SyncCommand),
    /// Upload the local ledger file to the remote store
    Upload(UploadCommand),
    /// Download the remote ledger file into the sync directory
    Download(DownloadCommand),
    /// Show sync status and eligibility
    Status(StatusCommand),
    /// List files in a remote folder
    List(ListCommand),
    /// View and manage sync preferences
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Watch the local file and synchronize continuously
    Watch(WatchCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path);
    if cli.metered {
        config.network.assume_metered = true;
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Auth(cmd) => cmd.execute(&config, format).await,
        Commands::Sync(cmd) => cmd.execute(&config, format).await,
        Commands::Upload(cmd) => cmd.execute(&config, format).await,
        Commands::Download(cmd) => cmd.execute(&config, format).await,
        Commands::Status(cmd) => cmd.execute(&config, format).await,
        Commands::List(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config, format).await,
        Commands::Watch(cmd) => cmd.execute(&config, format).await,
    }
}
