//! Shared test helpers for gateway integration tests
//!
//! Each helper mounts mock endpoints on a wiremock server and returns a
//! configured provider pointing at it, using an in-memory credential cache
//! so tests never touch the system keyring.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgersync_remote::credentials::MemoryCredentialCache;
use ledgersync_remote::{HttpRemoteStorage, HttpStorageClient};

/// Starts a mock gateway and returns it together with a provider.
pub async fn setup_gateway() -> (MockServer, HttpRemoteStorage) {
    let server = MockServer::start().await;
    let client = HttpStorageClient::new(server.uri(), "test-token");
    let provider = HttpRemoteStorage::new(client, Box::new(MemoryCredentialCache::default()));
    (server, provider)
}

/// Mounts a HEAD metadata endpoint for a file.
pub async fn mount_metadata(server: &MockServer, remote_path: &str, last_modified: &str) {
    Mock::given(method("HEAD"))
        .and(path(format!("/files/{remote_path}")))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Last-Modified", last_modified)
                .append_header("Content-Length", "4096"),
        )
        .mount(server)
        .await;
}

/// Mounts a GET download endpoint for a file.
pub async fn mount_download(server: &MockServer, remote_path: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{remote_path}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}
