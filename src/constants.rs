// Constants module - centralized default values for configuration

// =============================================================================
// API defaults
// =============================================================================

/// Default directory API endpoint
pub const DEFAULT_API_URL: &str = "https://api.master.openttd.org";

/// Default timeout for one API request in seconds
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Cache defaults
// =============================================================================

/// Seconds added to the API's expiry to absorb clock skew
pub const DEFAULT_CLOCK_DRIFT_ALLOWANCE_SECS: i64 = 1;

/// Local TTL when the API's expiry is ignored (2 minutes)
pub const DEFAULT_FIXED_TTL_SECS: u64 = 60 * 2;

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level filter
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Listing
// =============================================================================

/// Filter value that means "no filter"
pub const FILTER_ALL: &str = "all";

/// Message for a server id the API no longer knows about
pub const MSG_SERVER_GONE: &str = "This server (no longer) exists";

/// Message for any other API failure
pub const MSG_API_FAILED: &str = "API call failed; sorry for the inconvenience";
