//! The listing/deletion client: the `FilesClient` seam plus the HTTP
//! implementation against the Dropbox API v2.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::RemoteError;
use crate::model::{Entry, ListFolderPage, RawEntry};

const API_BASE: &str = "https://api.dropboxapi.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote listing/deletion operations the sweeper is written against.
#[async_trait]
pub trait FilesClient: Send + Sync {
    /// List `path`; with `recursive` the whole subtree is returned as one
    /// flat sequence, folders included.
    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Entry>, RemoteError>;

    /// Delete the entry at `path`.
    async fn delete(&self, path: &str) -> Result<(), RemoteError>;
}

/// reqwest-backed client for the Dropbox HTTP API.
pub struct DropboxFilesClient {
    http: Client,
    token: String,
    api_base: String,
}

impl DropboxFilesClient {
    pub fn new(token: impl Into<String>) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            token: token.into(),
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at a different API host (tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.api_base.trim_end_matches('/'), endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(RemoteError::Api {
                status,
                summary: api_error_summary(text),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl FilesClient for DropboxFilesClient {
    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Entry>, RemoteError> {
        let mut endpoint = "/2/files/list_folder";
        let mut request = json!({ "path": path, "recursive": recursive });
        let mut entries = Vec::new();

        loop {
            let page: ListFolderPage = self.call(endpoint, request).await?;
            entries.extend(page.entries.into_iter().filter_map(RawEntry::into_entry));
            if !page.has_more {
                break;
            }
            endpoint = "/2/files/list_folder/continue";
            request = json!({ "cursor": page.cursor });
        }

        debug!(count = entries.len(), path, "listing complete");
        Ok(entries)
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        let _: serde_json::Value = self
            .call("/2/files/delete_v2", json!({ "path": path }))
            .await?;
        Ok(())
    }
}

/// Dropbox error bodies carry an `error_summary`; fall back to the raw body
/// when the shape is something else.
fn api_error_summary(body: String) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        error_summary: String,
    }

    match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => err.error_summary,
        Err(_) => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_error_summary_from_api_body() {
        let body = r#"{"error_summary": "path/not_found/..", "error": {".tag": "path"}}"#;
        assert_eq!(api_error_summary(body.to_string()), "path/not_found/..");
    }

    #[test]
    fn falls_back_to_raw_body() {
        let body = "upstream gateway timeout";
        assert_eq!(api_error_summary(body.to_string()), body);
    }

    #[test]
    fn client_builds_with_custom_base() {
        let client = DropboxFilesClient::new("token")
            .expect("build client")
            .with_api_base("http://127.0.0.1:9999/");
        assert_eq!(client.api_base, "http://127.0.0.1:9999/");
    }
}
