//! `IRemoteStorage` implementation over the HTTP gateway
//!
//! Maps gateway responses onto `RemoteMetadata` snapshots. Modification
//! times come from the `Last-Modified` header (IMF-fixdate, parsed as
//! RFC 2822) for single files and from RFC 3339 fields in the JSON folder
//! listing.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use ledgersync_core::domain::{RemoteMetadata, RemotePath};
use ledgersync_core::ports::IRemoteStorage;

use crate::client::HttpStorageClient;
use crate::credentials::CredentialCache;

/// One entry of the JSON folder listing returned by `GET /list/{folder}`
#[derive(Debug, Deserialize)]
struct ListEntry {
    /// Full remote path of the file
    path: String,
    /// Last modification time (RFC 3339)
    modified: DateTime<Utc>,
    /// File size in bytes
    size: Option<u64>,
}

/// HTTP gateway implementation of the `IRemoteStorage` port
pub struct HttpRemoteStorage {
    client: HttpStorageClient,
    credentials: Box<dyn CredentialCache>,
}

impl HttpRemoteStorage {
    /// Creates a provider from an authenticated client and a credential cache
    pub fn new(client: HttpStorageClient, credentials: Box<dyn CredentialCache>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    fn file_path(path: &RemotePath) -> String {
        format!("/files/{}", path.as_str())
    }

    /// Checks the response status and captures any rotated token
    fn accept(&self, response: Response, what: &str) -> Result<Response> {
        self.client.note_renewed_token(&response);
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(anyhow!("{what}: credentials rejected ({status})"));
        }
        if !status.is_success() {
            return Err(anyhow!("{what}: unexpected status {status}"));
        }
        Ok(response)
    }

    fn metadata_from_headers(path: &RemotePath, response: &Response) -> Result<RemoteMetadata> {
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("Missing Last-Modified header for {path}"))?;

        let modified_at = DateTime::parse_from_rfc2822(last_modified)
            .with_context(|| format!("Unparseable Last-Modified: {last_modified}"))?
            .with_timezone(&Utc);

        let size = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        Ok(RemoteMetadata {
            path: path.as_str().to_string(),
            modified_at,
            size,
        })
    }
}

#[async_trait::async_trait]
impl IRemoteStorage for HttpRemoteStorage {
    async fn login(&self) -> Result<()> {
        debug!("Validating session against the gateway");
        let response = self
            .client
            .request(Method::GET, "/auth/session")
            .send()
            .await
            .context("Login request failed")?;
        self.accept(response, "login")?;

        // A rotated token from the login response should stick around.
        self.refresh_credential_cache()?;
        info!("Gateway session established");
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let response = self
            .client
            .request(Method::POST, "/auth/logout")
            .send()
            .await
            .context("Logout request failed")?;
        // Best-effort: clear the cache even if the gateway grumbled.
        if !response.status().is_success() {
            warn!(status = %response.status(), "Logout returned non-success status");
        }
        self.credentials.clear()?;
        info!("Logged out and cleared cached credentials");
        Ok(())
    }

    async fn list_contents(&self, folder: &str) -> Result<Vec<RemoteMetadata>> {
        let path = format!("/list/{folder}");
        debug!(folder, "Listing remote folder");

        let response = self
            .client
            .request(Method::GET, &path)
            .send()
            .await
            .with_context(|| format!("Listing folder failed: {folder}"))?;
        let response = self.accept(response, "list")?;

        let entries: Vec<ListEntry> = response
            .json()
            .await
            .context("Unparseable folder listing")?;

        Ok(entries
            .into_iter()
            .map(|e| RemoteMetadata {
                path: e.path,
                modified_at: e.modified,
                size: e.size,
            })
            .collect())
    }

    async fn get_metadata(&self, path: &RemotePath) -> Result<RemoteMetadata> {
        debug!(%path, "Fetching remote metadata");

        let response = self
            .client
            .request(Method::HEAD, &Self::file_path(path))
            .send()
            .await
            .with_context(|| format!("Metadata request failed: {path}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(anyhow!("Remote file not found: {path}"));
        }
        let response = self.accept(response, "metadata")?;

        Self::metadata_from_headers(path, &response)
    }

    async fn download(&self, path: &RemotePath) -> Result<Vec<u8>> {
        debug!(%path, "Downloading remote file");

        let response = self
            .client
            .request(Method::GET, &Self::file_path(path))
            .send()
            .await
            .with_context(|| format!("Download request failed: {path}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(anyhow!("Remote file not found: {path}"));
        }
        let response = self.accept(response, "download")?;

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Download body failed: {path}"))?;

        info!(%path, bytes = bytes.len(), "Downloaded remote file");
        Ok(bytes.to_vec())
    }

    async fn upload(&self, path: &RemotePath, data: &[u8], overwrite: bool) -> Result<()> {
        debug!(%path, bytes = data.len(), overwrite, "Uploading to remote");

        let mut request = self
            .client
            .request(Method::PUT, &Self::file_path(path))
            .body(data.to_vec());
        if !overwrite {
            request = request.header(reqwest::header::IF_NONE_MATCH, "*");
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Upload request failed: {path}"))?;

        if response.status() == StatusCode::PRECONDITION_FAILED {
            return Err(anyhow!("Remote file already exists: {path}"));
        }
        self.accept(response, "upload")?;

        info!(%path, bytes = data.len(), "Uploaded to remote");
        Ok(())
    }

    fn refresh_credential_cache(&self) -> Result<()> {
        self.credentials.persist(&self.client.current_token())
    }
}
