//! Credential cache
//!
//! Stores the gateway bearer token in the OS credential store (GNOME
//! Keyring, KDE Wallet, macOS Keychain) via the `keyring` crate. The cache
//! is behind a small trait so tests can substitute an in-memory store
//! without touching the user's keyring.

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Keyring service name under which tokens are stored
const KEYRING_SERVICE: &str = "ledgersync";

/// Abstraction over durable token storage
pub trait CredentialCache: Send + Sync {
    /// Persists the token
    fn persist(&self, token: &str) -> Result<()>;

    /// Loads the stored token, if any
    fn load(&self) -> Result<Option<String>>;

    /// Removes the stored token
    fn clear(&self) -> Result<()>;
}

/// Stores the bearer token in the system keyring
///
/// The configured account name is used as the keyring username, so multiple
/// remotes can coexist.
pub struct KeyringCredentialCache {
    account: String,
}

impl KeyringCredentialCache {
    /// Creates a cache for the given account name
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, &self.account)
            .context("Failed to create keyring entry")
    }
}

impl CredentialCache for KeyringCredentialCache {
    fn persist(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keyring")?;
        debug!(account = %self.account, "Stored token in keyring");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => {
                debug!(account = %self.account, "Loaded token from keyring");
                Ok(Some(token))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account = %self.account, "No token in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!(account = %self.account, "Cleared token from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

/// In-memory credential cache for tests
#[derive(Default)]
pub struct MemoryCredentialCache(std::sync::Mutex<Option<String>>);

impl CredentialCache for MemoryCredentialCache {
    fn persist(&self, token: &str) -> Result<()> {
        *self.0.lock().expect("cache lock poisoned") = Some(token.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(self.0.lock().expect("cache lock poisoned").clone())
    }

    fn clear(&self) -> Result<()> {
        *self.0.lock().expect("cache lock poisoned") = None;
        Ok(())
    }
}
