//! Server directory service
//!
//! Glue between the directory API, the caches and the record helpers.
//! Payloads are normalised (dates decoded, ids filled in, listing sorted)
//! once per fetch, before they are cached, so every request served from
//! the cache sees the same prepared data.

use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;

use crate::api::{ApiClient, DirectoryApi, FetchError};
use crate::cache::{CacheStats, DirectoryCache, Fetched};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ListingConfig};
use crate::constants::FILTER_ALL;
use crate::error::{Result, WebclientError};
use crate::server::ServerRecord;

/// Output of [`ServerDirectoryService::list_servers`]
///
/// Field names are the ones the listing template reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerListing {
    /// Matching servers, newest version first
    pub servers: Vec<ServerRecord>,
    /// "Data as of" timestamp, `YYYY-MM-DD HH:MM:SS UTC`
    pub expire: String,
    /// Sum of `clients_on` over `servers`
    pub clients: u64,
    pub servers_ipv4: usize,
    pub servers_ipv6: usize,
    /// The filter as requested, including `"all"`
    pub filter: Option<String>,
}

/// Output of [`ServerDirectoryService::get_server`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEntry {
    pub server: ServerRecord,
    pub expire: String,
}

/// Cached, annotated view of the server directory
pub struct ServerDirectoryService {
    api: Arc<dyn DirectoryApi>,
    clock: Arc<dyn Clock>,
    listing_cache: DirectoryCache<(), Vec<ServerRecord>>,
    entry_cache: DirectoryCache<String, Option<ServerRecord>>,
    listing: ListingConfig,
}

impl ServerDirectoryService {
    pub fn new(
        api: Arc<dyn DirectoryApi>,
        clock: Arc<dyn Clock>,
        listing_cache: DirectoryCache<(), Vec<ServerRecord>>,
        entry_cache: DirectoryCache<String, Option<ServerRecord>>,
        listing: ListingConfig,
    ) -> Self {
        Self {
            api,
            clock,
            listing_cache,
            entry_cache,
            listing,
        }
    }

    /// Service with caches built from `config` and the given collaborators
    pub fn with_api(api: Arc<dyn DirectoryApi>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self::new(
            api,
            clock,
            DirectoryCache::from_config(&config.cache),
            DirectoryCache::from_config(&config.cache),
            config.listing.clone(),
        )
    }

    /// Service talking HTTP to the configured API, on the system clock
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate().map_err(WebclientError::Config)?;
        let api = ApiClient::new(&config.api)?;
        Ok(Self::with_api(Arc::new(api), Arc::new(SystemClock), config))
    }

    /// List servers, optionally keeping only those whose version or build
    /// revision starts with `filter`
    ///
    /// An empty filter and `"all"` both mean no filtering.
    pub async fn list_servers(&self, filter: Option<&str>) -> Result<ServerListing> {
        let now = self.clock.now();
        let entry = self
            .listing_cache
            .get_or_fetch((), now, || self.refresh_listing())
            .await?;

        let prefix = filter.filter(|f| !f.is_empty() && *f != FILTER_ALL);
        let servers: Vec<ServerRecord> = match prefix {
            Some(prefix) => entry
                .payload
                .iter()
                .filter(|server| server.matches_version_prefix(prefix))
                .cloned()
                .collect(),
            None => entry.payload.clone(),
        };

        Ok(ServerListing {
            clients: servers.iter().map(ServerRecord::clients_on).sum(),
            servers_ipv4: servers.iter().filter(|s| s.has_ipv4()).count(),
            servers_ipv6: servers.iter().filter(|s| s.has_ipv6()).count(),
            expire: entry.as_of_display(),
            filter: filter.map(str::to_string),
            servers,
        })
    }

    /// Look up one server
    ///
    /// # Errors
    /// `WebclientError::ServerNotFound` when the API no longer lists the
    /// server; fetch failures are passed through unchanged.
    pub async fn get_server(&self, server_id: &str) -> Result<ServerEntry> {
        let now = self.clock.now();
        let entry = self
            .entry_cache
            .get_or_fetch(server_id.to_string(), now, || self.refresh_entry(server_id))
            .await?;

        match &entry.payload {
            Some(server) => Ok(ServerEntry {
                server: server.clone(),
                expire: entry.as_of_display(),
            }),
            None => Err(WebclientError::ServerNotFound {
                server_id: server_id.to_string(),
            }),
        }
    }

    async fn refresh_listing(&self) -> std::result::Result<Fetched<Vec<ServerRecord>>, FetchError> {
        let payload = self.api.fetch_listing().await?;
        let mut servers = payload.servers;

        for server in servers.iter_mut() {
            server.normalize_dates(self.listing.normalize_seen_times);
            server.ensure_server_id(None);
            server.annotate();
        }

        let mode = self.listing.ranking;
        servers.sort_by_cached_key(|server| Reverse(server.sort_key(mode)));

        tracing::info!(
            servers = servers.len(),
            expire = payload.expire,
            hit_rate = self.listing_cache.stats().hit_rate(),
            "Server listing refreshed"
        );

        Ok(Fetched {
            payload: servers,
            upstream_expires_at: payload.expire,
        })
    }

    async fn refresh_entry(
        &self,
        server_id: &str,
    ) -> std::result::Result<Fetched<Option<ServerRecord>>, FetchError> {
        let payload = self.api.fetch_server(server_id).await?;
        let server = payload.server.map(|mut server| {
            server.normalize_dates(self.listing.normalize_seen_times);
            server.ensure_server_id(Some(server_id));
            server.annotate();
            server
        });

        tracing::info!(
            server_id,
            listed = server.is_some(),
            expire = payload.expire,
            hit_rate = self.entry_cache.stats().hit_rate(),
            "Server entry refreshed"
        );

        Ok(Fetched {
            payload: server,
            upstream_expires_at: payload.expire,
        })
    }

    pub fn listing_cache_stats(&self) -> CacheStats {
        self.listing_cache.stats()
    }

    pub fn entry_cache_stats(&self) -> CacheStats {
        self.entry_cache.stats()
    }
}
