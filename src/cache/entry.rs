//! Cache entry type
//!
//! A `CacheEntry` holds one fetched payload together with the timestamps
//! that decide when it must be fetched again.

use crate::clock::{format_utc, Timestamp};

/// Cached payload with its expiry metadata
///
/// Entries are immutable once stored; a refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub payload: T,
    /// When this entry was fetched
    pub fetched_at: Timestamp,
    /// When this entry becomes stale (always `>= fetched_at`)
    pub expires_at: Timestamp,
    /// Expiry the upstream API announced for this payload
    pub upstream_expires_at: Timestamp,
    /// Timestamp shown to users as "data as of"
    pub as_of: Timestamp,
}

impl<T> CacheEntry<T> {
    /// An entry is stale strictly after its expiry second
    pub fn is_stale(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// `as_of` rendered as `YYYY-MM-DD HH:MM:SS UTC`
    pub fn as_of_display(&self) -> String {
        format_utc(self.as_of)
    }

    /// Seconds left before the entry goes stale (0 once stale)
    pub fn remaining_ttl(&self, now: Timestamp) -> i64 {
        (self.expires_at - now).max(0)
    }
}
