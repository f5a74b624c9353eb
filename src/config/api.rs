//! Directory API configuration.
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_API_URL};

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_api_timeout() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

/// Where the directory API lives and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API (default: https://api.master.openttd.org)
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_seconds: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("api.url cannot be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(format!(
                "api.url '{}' must start with http:// or https://",
                self.url
            ));
        }
        if self.timeout_seconds == 0 {
            return Err("api.timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}
