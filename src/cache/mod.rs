// Cache module
//
// Read-through cache in front of the directory API. One `DirectoryCache` per
// kind of payload: unit key for the full listing, server id for entry lookups.
//
// Entries are never evicted. A stale entry stays in the map until the next
// lookup for its key replaces it. The per-server map therefore grows with
// the number of distinct ids ever requested; that population is bounded by
// the servers that exist, so no size limit is applied.

pub mod config;
pub mod entry;
pub mod stats;

pub use config::{CacheConfig, ExpiryMode, ExpiryPolicy};
pub use entry::CacheEntry;
pub use stats::CacheStats;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use crate::clock::Timestamp;
use crate::request_coalescing::RequestCoalescer;
use stats::StatsCounters;

/// Result of one call to the fetch collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub payload: T,
    /// Expiry timestamp announced by the API
    pub upstream_expires_at: Timestamp,
}

/// Read-through TTL cache keyed by `K`
///
/// Lookups and stores each take the lock briefly; the fetch itself runs
/// without holding it. Without coalescing, two requests that both see a
/// stale entry both fetch and the later store wins. Stores replace whole
/// entries, so readers never observe a partial update.
#[derive(Debug)]
pub struct DirectoryCache<K, T> {
    entries: RwLock<HashMap<K, Arc<CacheEntry<T>>>>,
    policy: ExpiryPolicy,
    coalescer: Option<RequestCoalescer<K>>,
    counters: StatsCounters,
}

impl<K, T> DirectoryCache<K, T>
where
    K: Hash + Eq + Clone,
{
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
            coalescer: None,
            counters: StatsCounters::default(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let cache = Self::new(config.expiry_policy());
        if config.coalesce_fetches {
            cache.with_coalescing()
        } else {
            cache
        }
    }

    /// At most one in-flight fetch per key; concurrent callers wait for it
    pub fn with_coalescing(mut self) -> Self {
        self.coalescer = Some(RequestCoalescer::new());
        self
    }

    /// Current entry for `key`, stale or not
    pub fn peek(&self, key: &K) -> Option<Arc<CacheEntry<T>>> {
        self.entries.read().get(key).cloned()
    }

    fn fresh(&self, key: &K, now: Timestamp) -> Option<Arc<CacheEntry<T>>> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| !entry.is_stale(now))
            .cloned()
    }

    /// Return the entry for `key`, fetching it first when missing or stale
    ///
    /// A failed fetch is returned as-is: the previous entry is neither
    /// served nor removed, and nothing is retried.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: K,
        now: Timestamp,
        fetch: F,
    ) -> Result<Arc<CacheEntry<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Fetched<T>, E>>,
    {
        if let Some(entry) = self.fresh(&key, now) {
            StatsCounters::incr(&self.counters.hits);
            tracing::debug!(
                expires_at = entry.expires_at,
                remaining_ttl = entry.remaining_ttl(now),
                "Cache hit"
            );
            return Ok(entry);
        }
        StatsCounters::incr(&self.counters.misses);

        let _slot = match &self.coalescer {
            Some(coalescer) => {
                let slot = coalescer.acquire(&key).await;
                if slot.is_follower() {
                    if let Some(entry) = self.fresh(&key, now) {
                        tracing::debug!("Served by coalesced fetch");
                        return Ok(entry);
                    }
                }
                Some(slot)
            }
            None => None,
        };

        let fetched = match fetch().await {
            Ok(fetched) => fetched,
            Err(e) => {
                StatsCounters::incr(&self.counters.fetch_failures);
                return Err(e);
            }
        };

        let entry = Arc::new(CacheEntry {
            expires_at: self.policy.expires_at(fetched.upstream_expires_at, now),
            as_of: self.policy.as_of(fetched.upstream_expires_at),
            upstream_expires_at: fetched.upstream_expires_at,
            fetched_at: now,
            payload: fetched.payload,
        });

        self.entries.write().insert(key, Arc::clone(&entry));
        StatsCounters::incr(&self.counters.refreshes);

        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }
}
