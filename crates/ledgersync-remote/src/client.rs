//! HTTP client for the object-storage gateway
//!
//! Wraps `reqwest::Client` with bearer authentication and base URL
//! construction. The current token lives behind an `RwLock` because the
//! gateway can rotate it on any response (`X-Renewed-Token` header), and the
//! freshest token must be used for subsequent requests even while a long
//! transfer holds the provider immutably.

use std::sync::RwLock;

use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

/// Response header carrying a rotated bearer token
pub const RENEWED_TOKEN_HEADER: &str = "x-renewed-token";

/// Authenticated HTTP client for object-storage gateway calls
pub struct HttpStorageClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests, without a trailing slash
    base_url: String,
    /// Current bearer token; replaced when the gateway rotates it
    token: RwLock<String>,
}

impl HttpStorageClient {
    /// Creates a new client for the given gateway and token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            token: RwLock::new(token.into()),
        }
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a copy of the current bearer token
    pub fn current_token(&self) -> String {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, PUT, HEAD, ...)
    /// * `path` - API path relative to the base URL (e.g. "/files/Sync/budget.mmb")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(self.current_token())
    }

    /// Captures a rotated token from a response, if the gateway sent one
    ///
    /// Only updates the in-memory token; persisting it to the keyring is the
    /// caller's commit step after a successful transfer.
    pub fn note_renewed_token(&self, response: &Response) {
        if let Some(renewed) = response
            .headers()
            .get(RENEWED_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            debug!("Gateway rotated the bearer token");
            *self.token.write().expect("token lock poisoned") = renewed.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let client = HttpStorageClient::new("https://storage.example.com/v1/", "tok");
        assert_eq!(client.base_url(), "https://storage.example.com/v1");
    }

    #[test]
    fn test_current_token() {
        let client = HttpStorageClient::new("https://storage.example.com", "secret");
        assert_eq!(client.current_token(), "secret");
    }
}
