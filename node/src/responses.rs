//! Bounded cache of answered requests, used to replay responses to retries.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use strongbox_common::{CallResponse, RequestId};

/// Cached response entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    response: CallResponse,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(response: CallResponse) -> Self {
        Self {
            response,
            cached_at: Utc::now(),
        }
    }

    fn is_valid(&self, ttl: Duration) -> bool {
        Utc::now().signed_duration_since(self.cached_at) < ttl
    }
}

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct ResponseCacheConfig {
    /// How long a response can be replayed.
    pub ttl: Duration,
    /// Maximum number of entries; the oldest is evicted first.
    pub max_entries: usize,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(10),
            max_entries: 10_000,
        }
    }
}

/// Thread-safe response cache with TTL and a hard size bound.
pub struct ResponseCache {
    entries: DashMap<RequestId, CacheEntry>,
    /// Insertion order, for eviction.
    order: Mutex<VecDeque<RequestId>>,
    config: ResponseCacheConfig,
}

impl ResponseCache {
    /// Create a cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(ResponseCacheConfig::default())
    }

    /// Create a cache with custom configuration.
    pub fn with_config(config: ResponseCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            config,
        }
    }

    /// Recorded response for `request_id`, if present and not expired.
    pub fn get(&self, request_id: &RequestId) -> Option<CallResponse> {
        let entry = self.entries.get(request_id)?;
        if entry.is_valid(self.config.ttl) {
            Some(entry.response.clone())
        } else {
            debug!(request_id = %request_id, "Cached response expired");
            None
        }
    }

    /// Record a response, evicting the oldest entries beyond capacity.
    pub fn insert(&self, response: CallResponse) {
        let request_id = response.request_id;
        let mut order = self.order.lock();

        if self
            .entries
            .insert(request_id, CacheEntry::new(response))
            .is_none()
        {
            order.push_back(request_id);
        }

        while order.len() > self.config.max_entries.max(1) {
            if let Some(evicted) = order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_common::{CallOutcome, VaultStats};

    fn make_response() -> CallResponse {
        CallResponse {
            request_id: RequestId::new(),
            result: Ok(CallOutcome::Stats(VaultStats::default())),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ResponseCache::new();
        let response = make_response();

        cache.insert(response.clone());

        assert_eq!(cache.get(&response.request_id), Some(response));
        assert_eq!(cache.get(&RequestId::new()), None);
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let cache = ResponseCache::with_config(ResponseCacheConfig {
            max_entries: 3,
            ..Default::default()
        });
        let responses: Vec<CallResponse> = (0..5).map(|_| make_response()).collect();

        for response in &responses {
            cache.insert(response.clone());
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&responses[0].request_id), None);
        assert_eq!(cache.get(&responses[1].request_id), None);
        assert!(cache.get(&responses[4].request_id).is_some());
    }

    #[test]
    fn test_reinsert_does_not_grow_order() {
        let cache = ResponseCache::with_config(ResponseCacheConfig {
            max_entries: 2,
            ..Default::default()
        });
        let first = make_response();
        let second = make_response();

        cache.insert(first.clone());
        cache.insert(first.clone());
        cache.insert(second.clone());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&first.request_id).is_some());
    }

    #[test]
    fn test_expired_entry_is_not_replayed() {
        let cache = ResponseCache::with_config(ResponseCacheConfig {
            ttl: Duration::zero(),
            ..Default::default()
        });
        let response = make_response();

        cache.insert(response.clone());

        assert_eq!(cache.get(&response.request_id), None);
    }
}
