//! Directory API collaborator
//!
//! The service talks to the API only through [`DirectoryApi`], so tests can
//! swap the HTTP client for an in-memory fake.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::FetchError;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::clock::Timestamp;
use crate::server::ServerRecord;

/// Response of `GET /server`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPayload {
    #[serde(default)]
    pub servers: Vec<ServerRecord>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expire: Timestamp,
}

/// Response of `GET /server/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    /// `None` when the server is no longer listed
    #[serde(default)]
    pub server: Option<ServerRecord>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expire: Timestamp,
}

/// Accept the expiry as either an integer or a fractional unix timestamp
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.floor() as i64))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", value)))
}

/// Fetch collaborator for the server directory
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// All listed servers
    async fn fetch_listing(&self) -> Result<ListingPayload, FetchError>;

    /// One server by id
    async fn fetch_server(&self, server_id: &str) -> Result<EntryPayload, FetchError>;
}
