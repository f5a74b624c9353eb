//! HTTP client for the directory API

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{DirectoryApi, EntryPayload, FetchError, ListingPayload};
use crate::config::ApiConfig;

/// Status codes treated as success.
const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

/// reqwest-backed [`DirectoryApi`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl ApiClient {
    /// Creates a new API client
    ///
    /// # Errors
    /// Returns an error if the URL is empty or the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        if config.url.is_empty() {
            return Err(FetchError::InvalidConfig(
                "API url cannot be empty".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// `{base_url}/{segment}/...` with every segment percent-encoded
    pub fn endpoint(&self, path: &[&str]) -> String {
        let encoded: Vec<String> = path
            .iter()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, FetchError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Calling directory API");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Transport(format!(
                        "Request to {} timed out after {}s",
                        url,
                        self.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    FetchError::Transport(format!("Connection failed: {}", e))
                } else {
                    FetchError::Transport(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to read response body: {}", e)))?;

        if !SUCCESS_STATUSES.contains(&status) {
            tracing::warn!(status, body = %body, url = %url, "API failed");
            return Err(classify_failure(status, path, &body));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Map a non-success response onto a [`FetchError`]
pub fn classify_failure(status: u16, path: &[&str], body: &str) -> FetchError {
    match status {
        404 => FetchError::NotFound {
            path: path.join("/"),
        },
        400 if path.first() == Some(&"server") => FetchError::UnknownServer {
            server_id: path.get(1).copied().unwrap_or_default().to_string(),
        },
        _ => FetchError::Status {
            status,
            message: error_message(body),
        },
    }
}

/// The `errors` field of an error body, or a generic message
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("errors").cloned())
        .map(|errors| match errors {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| "API call failed".to_string())
}

#[async_trait]
impl DirectoryApi for ApiClient {
    async fn fetch_listing(&self) -> Result<ListingPayload, FetchError> {
        self.get_json(&["server"]).await
    }

    async fn fetch_server(&self, server_id: &str) -> Result<EntryPayload, FetchError> {
        self.get_json(&["server", server_id]).await
    }
}
