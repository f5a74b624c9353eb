//! Listing presentation options.

use serde::{Deserialize, Serialize};

use crate::version::RankingMode;

fn default_normalize_seen_times() -> bool {
    true
}

/// How listing and entry payloads are annotated and ordered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Version ranking heuristic (default: full)
    #[serde(default)]
    pub ranking: RankingMode,
    /// Render `time_first_seen` / `time_last_seen` as UTC strings (default: true)
    #[serde(default = "default_normalize_seen_times")]
    pub normalize_seen_times: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            ranking: RankingMode::default(),
            normalize_seen_times: default_normalize_seen_times(),
        }
    }
}
