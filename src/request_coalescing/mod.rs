// Request coalescing
//
// Deduplicates concurrent refreshes of the same cache key:
// - First request (leader): fetches from the API, stores the result, signals completion
// - Later requests (followers): wait for the leader, then read the cache
//
// Opt-in through `cache.coalesce_fetches`. Without it, concurrent requests that
// see the same stale entry each call the API and the last write wins.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::watch;

/// Tracks in-flight refreshes per key
#[derive(Debug)]
pub struct RequestCoalescer<K> {
    /// key -> completion signal of the running leader
    in_flight: Arc<Mutex<HashMap<K, watch::Sender<bool>>>>,
}

impl<K> Clone for RequestCoalescer<K> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<K> Default for RequestCoalescer<K> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> RequestCoalescer<K>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a coalescing slot for `key`
    ///
    /// Returns `CoalescingSlot::Leader` if nobody is refreshing the key;
    /// the leader refreshes, stores, then drops the guard. Otherwise waits
    /// for the running leader to finish and returns `CoalescingSlot::Follower`.
    pub async fn acquire(&self, key: &K) -> CoalescingSlot<K> {
        let receiver = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(key) {
                Some(sender) => Some(sender.subscribe()),
                None => {
                    let (tx, _rx) = watch::channel(false);
                    in_flight.insert(key.clone(), tx);
                    return CoalescingSlot::Leader(LeaderGuard {
                        key: key.clone(),
                        in_flight: Arc::clone(&self.in_flight),
                    });
                }
            }
        };

        if let Some(mut rx) = receiver {
            // Err means the leader vanished without signalling; treat it as done.
            let _ = rx.wait_for(|&completed| completed).await;
        }
        CoalescingSlot::Follower
    }

    /// Number of keys currently being refreshed
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}

/// Result of acquiring a coalescing slot
#[derive(Debug)]
pub enum CoalescingSlot<K>
where
    K: Hash + Eq,
{
    /// Nobody else is refreshing this key; the caller fetches.
    Leader(LeaderGuard<K>),
    /// Another request refreshed the key while we waited.
    Follower,
}

impl<K> CoalescingSlot<K>
where
    K: Hash + Eq,
{
    pub fn is_leader(&self) -> bool {
        matches!(self, CoalescingSlot::Leader(_))
    }

    pub fn is_follower(&self) -> bool {
        matches!(self, CoalescingSlot::Follower)
    }
}

/// Held by the leader; dropping it releases the key and wakes all followers
#[derive(Debug)]
pub struct LeaderGuard<K>
where
    K: Hash + Eq,
{
    key: K,
    in_flight: Arc<Mutex<HashMap<K, watch::Sender<bool>>>>,
}

impl<K> Drop for LeaderGuard<K>
where
    K: Hash + Eq,
{
    fn drop(&mut self) {
        let sender = self.in_flight.lock().remove(&self.key);
        if let Some(sender) = sender {
            // No receivers just means nobody was waiting.
            let _ = sender.send(true);
        }
    }
}
