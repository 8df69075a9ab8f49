//! Integration tests for the HTTP gateway provider

use chrono::{TimeZone, Utc};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgersync_core::domain::RemotePath;
use ledgersync_core::ports::IRemoteStorage;
use ledgersync_remote::credentials::MemoryCredentialCache;
use ledgersync_remote::{HttpRemoteStorage, HttpStorageClient};

use crate::common;

// ============================================================================
// Metadata
// ============================================================================

#[tokio::test]
async fn test_get_metadata_parses_last_modified() {
    let (server, provider) = common::setup_gateway().await;
    common::mount_metadata(&server, "Sync/budget.mmb", "Wed, 01 May 2024 12:30:00 GMT").await;

    let remote = RemotePath::new("Sync/budget.mmb").unwrap();
    let meta = provider.get_metadata(&remote).await.expect("metadata failed");

    assert_eq!(meta.path, "Sync/budget.mmb");
    assert_eq!(
        meta.modified_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    );
    assert_eq!(meta.size, Some(4096));
}

#[tokio::test]
async fn test_get_metadata_missing_file_is_error() {
    let (server, provider) = common::setup_gateway().await;

    Mock::given(method("HEAD"))
        .and(path("/files/Sync/missing.mmb"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let remote = RemotePath::new("Sync/missing.mmb").unwrap();
    let err = provider.get_metadata(&remote).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}

// ============================================================================
// Download / upload
// ============================================================================

#[tokio::test]
async fn test_download_returns_content() {
    let (server, provider) = common::setup_gateway().await;
    let content = b"ledger bytes";
    common::mount_download(&server, "Sync/budget.mmb", content).await;

    let remote = RemotePath::new("Sync/budget.mmb").unwrap();
    let data = provider.download(&remote).await.expect("download failed");
    assert_eq!(data, content);
}

#[tokio::test]
async fn test_upload_sends_bearer_token() {
    let server = MockServer::start().await;
    let client = HttpStorageClient::new(server.uri(), "secret-token");
    let provider = HttpRemoteStorage::new(client, Box::new(MemoryCredentialCache::default()));

    Mock::given(method("PUT"))
        .and(path("/files/Sync/budget.mmb"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RemotePath::new("Sync/budget.mmb").unwrap();
    provider
        .upload(&remote, b"data", true)
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_upload_without_overwrite_sets_precondition() {
    let (server, provider) = common::setup_gateway().await;

    Mock::given(method("PUT"))
        .and(path("/files/Sync/budget.mmb"))
        .and(header("If-None-Match", "*"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&server)
        .await;

    let remote = RemotePath::new("Sync/budget.mmb").unwrap();
    let err = provider.upload(&remote, b"data", false).await.unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_upload_rejected_credentials_is_error() {
    let (server, provider) = common::setup_gateway().await;

    Mock::given(method("PUT"))
        .and(path("/files/Sync/budget.mmb"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let remote = RemotePath::new("Sync/budget.mmb").unwrap();
    let err = provider.upload(&remote, b"data", true).await.unwrap_err();
    assert!(err.to_string().contains("credentials rejected"));
}

// ============================================================================
// Folder listing
// ============================================================================

#[tokio::test]
async fn test_list_contents_maps_entries() {
    let (server, provider) = common::setup_gateway().await;

    Mock::given(method("GET"))
        .and(path("/list/Sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"path": "Sync/budget.mmb", "modified": "2024-05-01T12:30:00Z", "size": 4096},
            {"path": "Sync/archive.mmb", "modified": "2023-11-20T08:00:00Z", "size": null}
        ])))
        .mount(&server)
        .await;

    let entries = provider.list_contents("Sync").await.expect("list failed");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "Sync/budget.mmb");
    assert_eq!(entries[0].size, Some(4096));
    assert_eq!(entries[1].size, None);
}

// ============================================================================
// Token rotation
// ============================================================================

#[tokio::test]
async fn test_rotated_token_used_and_persisted() {
    let server = MockServer::start().await;
    let client = HttpStorageClient::new(server.uri(), "old-token");
    let cache = Box::new(MemoryCredentialCache::default());

    Mock::given(method("GET"))
        .and(path("/files/Sync/budget.mmb"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"bytes".to_vec())
                .append_header("X-Renewed-Token", "new-token"),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/files/Sync/budget.mmb"))
        .and(header("Authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpRemoteStorage::new(client, cache);
    let remote = RemotePath::new("Sync/budget.mmb").unwrap();

    // Download rotates the in-memory token; the next request must use it.
    provider.download(&remote).await.expect("download failed");
    provider
        .upload(&remote, b"data", true)
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_logout_clears_credential_cache() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpStorageClient::new(server.uri(), "tok");
    let provider = HttpRemoteStorage::new(client, Box::new(MemoryCredentialCache::default()));

    provider.refresh_credential_cache().unwrap();
    provider.logout().await.expect("logout failed");
}
