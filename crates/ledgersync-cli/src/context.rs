//! Shared adapter wiring for CLI commands
//!
//! Every command that talks to the remote store needs the same dependency
//! graph: preference store, credential cache, HTTP provider, network probe,
//! upload scheduler, reconciler. [`establish`] builds it once from the
//! loaded configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

use ledgersync_core::config::Config;
use ledgersync_engine::{Reconciler, TokioUploadScheduler};
use ledgersync_remote::{
    CredentialCache, HttpRemoteStorage, HttpStorageClient, KeyringCredentialCache,
    TcpNetworkProbe,
};
use ledgersync_store::JsonPreferenceStore;

/// A fully wired command session
pub struct Session {
    pub prefs: Arc<JsonPreferenceStore>,
    pub reconciler: Arc<Reconciler>,
    pub scheduler: Arc<TokioUploadScheduler>,
    /// Receiving end of the delayed-upload due channel (drained by watch mode)
    pub due: mpsc::Receiver<String>,
}

impl Session {
    /// The local ledger path: explicit override, or derived from the
    /// configured remote path
    pub fn resolve_local(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        self.reconciler.local_path_for_remote().context(
            "No local file given and no remote path configured. \
             Run 'ledgersync config set-remote <path>' or pass a file.",
        )
    }
}

/// Wires the adapters into a [`Session`].
///
/// When `require_credentials` is set and the keyring holds no token, fails
/// with a hint to log in; otherwise an empty token is used and the gateway
/// rejects any actual transfer.
pub fn establish(config: &Config, require_credentials: bool) -> Result<Session> {
    if config.remote.base_url.is_empty() {
        bail!(
            "No remote base URL configured; set remote.base_url in {}",
            Config::default_path().display()
        );
    }

    let prefs = Arc::new(
        JsonPreferenceStore::open(Config::default_prefs_path())
            .context("Failed to open preference store")?,
    );

    let credentials = KeyringCredentialCache::new(config.remote.account.as_str());
    let token = match credentials.load().context("Failed to read credentials")? {
        Some(token) => token,
        None if require_credentials => {
            bail!("No stored credentials. Run 'ledgersync auth login' first.")
        }
        None => {
            debug!("No stored credentials; proceeding without a token");
            String::new()
        }
    };

    let client = HttpStorageClient::new(config.remote.base_url.clone(), token);
    let remote = Arc::new(HttpRemoteStorage::new(client, Box::new(credentials)));

    let probe = Arc::new(TcpNetworkProbe::from_base_url(
        &config.remote.base_url,
        Duration::from_millis(config.network.probe_timeout_ms),
        config.network.assume_metered,
    )?);

    let (scheduler, due) = TokioUploadScheduler::new();
    let scheduler = Arc::new(scheduler);

    let reconciler = Arc::new(Reconciler::new(
        remote,
        prefs.clone(),
        probe,
        scheduler.clone(),
        config,
    ));

    Ok(Session {
        prefs,
        reconciler,
        scheduler,
        due,
    })
}
