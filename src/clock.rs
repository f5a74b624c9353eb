//! Wall-clock source for cache expiry decisions

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Unix timestamp in whole seconds.
pub type Timestamp = i64;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// Manually advanced clock
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the service under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Render a timestamp the way listings display it: `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_utc(timestamp: Timestamp) -> String {
    match chrono::DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => format!("{} UTC", dt.format("%Y-%m-%d %H:%M:%S")),
        None => format!("{} UTC", timestamp),
    }
}
