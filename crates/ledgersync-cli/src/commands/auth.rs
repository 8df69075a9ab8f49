//! Auth commands - manage gateway credentials
//!
//! `login` stores a bearer token in the system keyring after validating it
//! against the gateway's session endpoint. `logout` terminates the session
//! and clears the stored token.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use ledgersync_core::config::Config;
use ledgersync_core::ports::IRemoteStorage;
use ledgersync_remote::{HttpRemoteStorage, HttpStorageClient, KeyringCredentialCache};

use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Validate a token against the gateway and store it in the keyring
    Login(LoginArgs),
    /// End the session and clear the stored token
    Logout,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Gateway bearer token (falls back to $LEDGERSYNC_TOKEN)
    #[arg(long)]
    pub token: Option<String>,
}

impl AuthCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        match self {
            AuthCommand::Login(args) => login(args, config, format).await,
            AuthCommand::Logout => logout(config, format).await,
        }
    }
}

async fn login(args: &LoginArgs, config: &Config, format: OutputFormat) -> Result<()> {
    if config.remote.base_url.is_empty() {
        format.error("No remote base URL configured; set remote.base_url first.");
        return Ok(());
    }

    let token = match args.token.clone().or_else(|| {
        std::env::var("LEDGERSYNC_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
    }) {
        Some(token) => token,
        None => {
            format.error("No token given. Pass --token or set $LEDGERSYNC_TOKEN.");
            return Ok(());
        }
    };

    let client = HttpStorageClient::new(config.remote.base_url.clone(), token);
    let credentials = KeyringCredentialCache::new(config.remote.account.as_str());
    let provider = HttpRemoteStorage::new(client, Box::new(credentials));

    provider
        .login()
        .await
        .context("Login failed; the gateway rejected the token")?;

    if format.is_json() {
        format.value(&serde_json::json!({
            "logged_in": true,
            "account": config.remote.account,
        }));
    } else {
        format.success(&format!(
            "Logged in to {} as account '{}'",
            config.remote.base_url, config.remote.account
        ));
    }
    Ok(())
}

async fn logout(config: &Config, format: OutputFormat) -> Result<()> {
    let credentials = KeyringCredentialCache::new(config.remote.account.as_str());

    use ledgersync_remote::CredentialCache;
    let Some(token) = credentials.load().context("Failed to read credentials")? else {
        format.warn("No stored credentials; nothing to do.");
        return Ok(());
    };

    let client = HttpStorageClient::new(config.remote.base_url.clone(), token);
    let provider = HttpRemoteStorage::new(client, Box::new(credentials));

    provider.logout().await.context("Logout failed")?;

    format.success("Logged out; stored credentials cleared");
    Ok(())
}
