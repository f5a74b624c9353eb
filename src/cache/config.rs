//! Cache configuration and expiry policy

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::constants::{DEFAULT_CLOCK_DRIFT_ALLOWANCE_SECS, DEFAULT_FIXED_TTL_SECS};

/// Which clock decides when a cached payload goes stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryMode {
    /// Trust the `expire` timestamp the API sends, plus a drift allowance.
    #[default]
    Upstream,
    /// Ignore the API's expiry and keep payloads for a fixed local TTL.
    FixedTtl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub expiry: ExpiryMode,
    #[serde(default = "default_clock_drift_allowance_seconds")]
    pub clock_drift_allowance_seconds: i64,
    #[serde(default = "default_fixed_ttl_seconds")]
    pub fixed_ttl_seconds: u64,
    /// Let only one request per key refresh at a time; the others wait
    /// for its result instead of calling the API themselves.
    #[serde(default)]
    pub coalesce_fetches: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry: ExpiryMode::default(),
            clock_drift_allowance_seconds: default_clock_drift_allowance_seconds(),
            fixed_ttl_seconds: default_fixed_ttl_seconds(),
            coalesce_fetches: false,
        }
    }
}

fn default_clock_drift_allowance_seconds() -> i64 {
    DEFAULT_CLOCK_DRIFT_ALLOWANCE_SECS
}

// The API itself caches for 5 minutes, so a listing can lag up to ~7.
fn default_fixed_ttl_seconds() -> u64 {
    DEFAULT_FIXED_TTL_SECS
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.clock_drift_allowance_seconds < 0 {
            return Err(format!(
                "clock_drift_allowance_seconds ({}) cannot be negative",
                self.clock_drift_allowance_seconds
            ));
        }
        if self.expiry == ExpiryMode::FixedTtl && self.fixed_ttl_seconds == 0 {
            return Err("fixed_ttl_seconds must be greater than 0 when expiry is fixed_ttl".to_string());
        }
        Ok(())
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        match self.expiry {
            ExpiryMode::Upstream => ExpiryPolicy::Upstream {
                drift_allowance_secs: self.clock_drift_allowance_seconds,
            },
            ExpiryMode::FixedTtl => ExpiryPolicy::FixedTtl {
                ttl_secs: i64::try_from(self.fixed_ttl_seconds).unwrap_or(i64::MAX),
            },
        }
    }
}

/// Resolved expiry rule applied when an entry is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    Upstream { drift_allowance_secs: i64 },
    FixedTtl { ttl_secs: i64 },
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        CacheConfig::default().expiry_policy()
    }
}

impl ExpiryPolicy {
    /// Stale-after timestamp for a payload fetched at `now`
    ///
    /// Never earlier than `now`, so an upstream expiry that already lies
    /// in the past still serves the payload for the current second.
    pub fn expires_at(&self, upstream_expires_at: Timestamp, now: Timestamp) -> Timestamp {
        let expires_at = match *self {
            ExpiryPolicy::Upstream {
                drift_allowance_secs,
            } => upstream_expires_at.saturating_add(drift_allowance_secs),
            ExpiryPolicy::FixedTtl { ttl_secs } => now.saturating_add(ttl_secs),
        };
        expires_at.max(now)
    }

    /// Timestamp to display as "data as of"
    pub fn as_of(&self, upstream_expires_at: Timestamp) -> Timestamp {
        match *self {
            ExpiryPolicy::Upstream {
                drift_allowance_secs,
            } => upstream_expires_at.saturating_add(drift_allowance_secs),
            ExpiryPolicy::FixedTtl { .. } => upstream_expires_at,
        }
    }
}
