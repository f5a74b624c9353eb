//! Version string ranking
//!
//! Official releases follow `MAJOR.MINOR.PATCH[-suffix]`; patch-packs do
//! whatever they like, most commonly `name-MAJOR.MINOR.PATCH[-suffix]`.
//! [`rank`] guesses which of the two a string is and produces a key that
//! orders newest first when sorted descending. Anything unrecognised falls
//! to the bottom tier and is only compared by its raw string.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Tier for releases without a `-` suffix.
pub const PRIORITY_STABLE: u32 = 10;
/// Tier for suffixed builds (pre-releases, patch-packs).
pub const PRIORITY_SUFFIXED: u32 = 5;
/// Tier for strings that could not be parsed.
pub const PRIORITY_UNKNOWN: u32 = 0;

const KIND_OFFICIAL: &str = "official";
const KIND_UNKNOWN: &str = "unknown";
const EXTRA_STABLE: &str = "stable";

/// Which ranking heuristic to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Stable/suffixed tiers plus patch-pack recognition.
    #[default]
    Full,
    /// Single tier: only `MAJOR.MINOR.PATCH` before the first `-` is
    /// recognised, everything else is unknown.
    Simple,
}

/// Non-negative version component of any length
///
/// Stored as its decimal digits without leading zeros, so `007` equals `7`
/// and no value is too large to compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionNumber(String);

impl VersionNumber {
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Parse a string of ASCII digits; anything else is rejected
    pub fn parse(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Some(Self::zero())
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for VersionNumber {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        // More digits means larger once leading zeros are gone.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort key for a version string
///
/// Compared field by field in declaration order. Only used for ordering;
/// never shown to users.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionSortKey {
    pub priority: u32,
    pub numbers: [VersionNumber; 3],
    /// `"official"`, the patch-pack name, or `"unknown"`.
    pub kind: String,
    /// Remaining suffix (or the raw string for unknown versions).
    pub residual: String,
}

impl VersionSortKey {
    fn unknown(raw: &str) -> Self {
        Self {
            priority: PRIORITY_UNKNOWN,
            numbers: [VersionNumber::zero(), VersionNumber::zero(), VersionNumber::zero()],
            kind: KIND_UNKNOWN.to_string(),
            residual: raw.to_string(),
        }
    }

    /// True when the string was recognised as an official release or a
    /// patch-pack.
    pub fn is_recognized(&self) -> bool {
        self.priority != PRIORITY_UNKNOWN
    }
}

/// Parse `MAJOR.MINOR.PATCH` where every component is made of ASCII digits
fn parse_triple(s: &str) -> Option<[VersionNumber; 3]> {
    let mut parts = s.split('.');
    let major = VersionNumber::parse(parts.next()?)?;
    let minor = VersionNumber::parse(parts.next()?)?;
    let patch = VersionNumber::parse(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some([major, minor, patch])
}

/// Rank a version string with the default ([`RankingMode::Full`]) heuristic
pub fn rank(raw: &str) -> VersionSortKey {
    rank_with(raw, RankingMode::Full)
}

/// Rank a version string with the given heuristic
pub fn rank_with(raw: &str, mode: RankingMode) -> VersionSortKey {
    match mode {
        RankingMode::Full => rank_full(raw),
        RankingMode::Simple => rank_simple(raw),
    }
}

fn rank_full(raw: &str) -> VersionSortKey {
    let (version, extra, priority) = match raw.split_once('-') {
        Some((version, extra)) => (version, extra, PRIORITY_SUFFIXED),
        None => (raw, EXTRA_STABLE, PRIORITY_STABLE),
    };

    if let Some(numbers) = parse_triple(version) {
        return VersionSortKey {
            priority,
            numbers,
            kind: KIND_OFFICIAL.to_string(),
            residual: extra.to_string(),
        };
    }

    // Patch-pack like "jgrpp-0.31.0".
    let (first, rest) = extra.split_once('-').unwrap_or((extra, ""));
    if let Some(numbers) = parse_triple(first) {
        return VersionSortKey {
            priority,
            numbers,
            kind: version.to_string(),
            residual: rest.to_string(),
        };
    }

    VersionSortKey::unknown(raw)
}

fn rank_simple(raw: &str) -> VersionSortKey {
    let (version, extra) = raw.split_once('-').unwrap_or((raw, EXTRA_STABLE));

    match parse_triple(version) {
        Some(numbers) => VersionSortKey {
            priority: PRIORITY_SUFFIXED,
            numbers,
            kind: KIND_OFFICIAL.to_string(),
            residual: extra.to_string(),
        },
        None => VersionSortKey::unknown(raw),
    }
}

/// Descending comparison: the newer version orders first
pub fn compare_desc(a: &str, b: &str, mode: RankingMode) -> Ordering {
    rank_with(b, mode).cmp(&rank_with(a, mode))
}
