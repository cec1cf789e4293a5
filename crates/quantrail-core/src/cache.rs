//! In-memory response cache with TTL expiry and LRU eviction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::transform::RecordSet;

/// Defines the cache behavior for a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present;
    /// otherwise fetch and write the response back. (Default)
    #[default]
    Use,
    /// Always fetch, bypassing any cached entry, and write the new response.
    Refresh,
    /// Always fetch and neither read from nor write to the cache.
    Bypass,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: RecordSet,
    expires_at: Instant,
    last_access: u64,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    capacity: usize,
    default_ttl: Duration,
    /// Monotonic access tick; higher means more recently touched.
    tick: u64,
}

impl CacheInner {
    fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            capacity: capacity.max(1),
            default_ttl,
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn get(&mut self, key: &str) -> Option<RecordSet> {
        let now = Instant::now();
        let expired = match self.map.get(key) {
            Some(entry) => entry.expires_at <= now,
            None => return None,
        };
        if expired {
            // Expired at or before now: treat as absent and drop it.
            self.map.remove(key);
            return None;
        }
        let tick = self.next_tick();
        let entry = self.map.get_mut(key).expect("entry checked above");
        entry.last_access = tick;
        Some(entry.value.clone())
    }

    fn set(&mut self, key: String, value: RecordSet, ttl_override: Option<Duration>) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            self.evict_lru();
        }
        let last_access = self.next_tick();
        self.map.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
                last_access,
            },
        );
    }

    /// Remove the entry with the oldest last-access tick. Linear scan; runs
    /// only when an insert would exceed capacity.
    fn evict_lru(&mut self) {
        let oldest = self
            .map
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            tracing::debug!(%key, "evicting least recently used cache entry");
            self.map.remove(&key);
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Capacity- and time-bounded cache for transformed responses.
///
/// Lookups refresh recency, expired entries are evicted on observation, and
/// inserting past capacity evicts the least recently used entry first. A
/// disabled store turns `get` and `set` into no-ops.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<tokio::sync::Mutex<CacheInner>>,
    enabled: bool,
}

impl CacheStore {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(CacheInner::new(
                capacity,
                default_ttl,
            ))),
            enabled: true,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.capacity, config.default_ttl)
        } else {
            Self::disabled()
        }
    }

    /// A store that never caches anything.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(CacheInner::new(0, Duration::ZERO))),
            enabled: false,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached value for `key`, if present and not yet expired.
    ///
    /// A hit refreshes the entry's recency; an expired entry is removed as a
    /// side effect and reported as absent.
    pub async fn get(&self, key: &str) -> Option<RecordSet> {
        if !self.enabled {
            return None;
        }
        self.inner.lock().await.get(key)
    }

    /// Insert `value` under `key`, evicting the least recently used entry if
    /// the store is at capacity. `ttl_override` replaces the default TTL for
    /// this entry only.
    pub async fn set(&self, key: String, value: RecordSet, ttl_override: Option<Duration>) {
        if !self.enabled {
            return;
        }
        self.inner.lock().await.set(key, value, ttl_override);
    }

    /// Remove `key`; returns whether an entry existed.
    pub async fn delete(&self, key: &str) -> bool {
        self.inner.lock().await.delete(key)
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    /// Number of live entries, including any not yet observed as expired.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
