use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Internal cache entry with timestamp
struct CacheEntry<V> {
    data: V,
    cached_at: DateTime<Utc>,
}

/// Concurrent key/value cache whose entries expire `ttl` after insertion.
pub struct TtlCache<K, V, C = SystemClock>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - cached_at < self.ttl
    }

    /// Returns a clone of the cached value if it has not expired. Expired
    /// entries are evicted on access.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let hit = self.entries.get(key).and_then(|entry| {
            if self.is_fresh(entry.cached_at, now) {
                Some(entry.data.clone())
            } else {
                None
            }
        });
        if hit.is_none() {
            self.entries
                .remove_if(key, |_, entry| !self.is_fresh(entry.cached_at, now));
        }
        hit
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                data: value,
                cached_at: self.clock.now(),
            },
        );
    }

    /// Returns the cached value or computes, stores and returns a new one.
    /// Errors from `load` are returned without touching the cache.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = load()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| self.is_fresh(entry.cached_at, now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
