//! In-memory geocoding cache.
//!
//! TTL: 24 hours. Capacity: 100 entries. Keys are the exact query strings.
//! When an insert overflows the capacity, expired entries are purged first and
//! then the least-recently-used entry is evicted. Reads refresh recency.

use crate::geo::Coordinate;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

pub const DEFAULT_TTL_MS: i64 = 24 * 3600 * 1000; // 24 hours in ms
pub const DEFAULT_CAPACITY: usize = 100;

/// Source of wall-clock time in milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self { now: Rc::new(Cell::new(start_ms)) }
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    coordinate: Coordinate,
    stored_at: i64,
    last_used: u64,
}

/// Bounded, time-limited map from query text to coordinate.
pub struct GeoCache {
    entries: HashMap<String, CacheEntry>,
    clock: Box<dyn Clock>,
    ttl_ms: i64,
    capacity: usize,
    tick: u64,
}

impl GeoCache {
    /// 24 h TTL, 100 entries, system clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self::with_limits(clock, DEFAULT_TTL_MS, DEFAULT_CAPACITY)
    }

    pub fn with_limits(clock: Box<dyn Clock>, ttl_ms: i64, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            ttl_ms,
            capacity,
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        now - entry.stored_at >= self.ttl_ms
    }

    /// Look up a query. Returns None if missing or expired.
    pub fn get(&mut self, query: &str) -> Option<Coordinate> {
        let now = self.clock.now_millis();
        let expired = self.is_expired(self.entries.get(query)?, now);
        if expired {
            self.entries.remove(query);
            return None;
        }
        let tick = self.next_tick();
        let entry = self.entries.get_mut(query)?;
        entry.last_used = tick;
        Some(entry.coordinate)
    }

    /// Store a coordinate under `query`, evicting if over capacity.
    pub fn put(&mut self, query: &str, coordinate: Coordinate) {
        if self.capacity == 0 {
            return;
        }
        let now = self.clock.now_millis();
        let tick = self.next_tick();
        self.entries.insert(
            query.to_string(),
            CacheEntry { coordinate, stored_at: now, last_used: tick },
        );

        if self.entries.len() > self.capacity {
            let ttl_ms = self.ttl_ms;
            self.entries.retain(|_, e| now - e.stored_at < ttl_ms);
        }
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Number of entries, including any not yet purged after expiry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache(capacity: usize) -> (GeoCache, ManualClock) {
        let clock = ManualClock::new(1_000);
        let cache = GeoCache::with_limits(Box::new(clock.clone()), DEFAULT_TTL_MS, capacity);
        (cache, clock)
    }

    #[test]
    fn test_cache_put_get() {
        let (mut cache, _clock) = test_cache(10);
        cache.put("Stockholm, Sweden", Coordinate::new(59.3293, 18.0686));

        let result = cache.get("Stockholm, Sweden").unwrap();
        assert_eq!(result, Coordinate::new(59.3293, 18.0686));
    }

    #[test]
    fn test_cache_keys_are_exact() {
        let (mut cache, _clock) = test_cache(10);
        cache.put("New York", Coordinate::new(40.7128, -74.006));

        assert!(cache.get("new york").is_none());
        assert!(cache.get("New York ").is_none());
        assert!(cache.get("New York").is_some());
    }

    #[test]
    fn test_cache_miss() {
        let (mut cache, _clock) = test_cache(10);
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn test_cache_expiry() {
        let (mut cache, clock) = test_cache(10);
        cache.put("Tokyo", Coordinate::new(35.6762, 139.6503));

        clock.advance(DEFAULT_TTL_MS - 1);
        assert!(cache.get("Tokyo").is_some());

        clock.advance(1);
        assert!(cache.get("Tokyo").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let (mut cache, _clock) = test_cache(2);
        cache.put("a", Coordinate::new(1.0, 1.0));
        cache.put("b", Coordinate::new(2.0, 2.0));
        // touch "a" so that "b" is the least recently used
        assert!(cache.get("a").is_some());
        cache.put("c", Coordinate::new(3.0, 3.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_expired_entries_purged_before_lru() {
        let (mut cache, clock) = test_cache(2);
        cache.put("old", Coordinate::new(1.0, 1.0));
        clock.advance(DEFAULT_TTL_MS / 2);
        cache.put("fresh", Coordinate::new(2.0, 2.0));
        clock.advance(DEFAULT_TTL_MS / 2);
        // "old" is now expired, "fresh" is still valid but least recently used
        cache.put("new", Coordinate::new(3.0, 3.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("fresh").is_some());
        assert!(cache.get("new").is_some());
    }

    #[test]
    fn test_default_capacity_bound() {
        let (mut cache, _clock) = test_cache(DEFAULT_CAPACITY);
        for i in 0..(DEFAULT_CAPACITY + 25) {
            cache.put(&format!("place {}", i), Coordinate::new(i as f64 / 10.0, 0.0));
        }
        assert_eq!(cache.len(), DEFAULT_CAPACITY);
        assert!(cache.get("place 0").is_none());
        assert!(cache.get(&format!("place {}", DEFAULT_CAPACITY + 24)).is_some());
    }

    #[test]
    fn test_overwrite_refreshes_timestamp() {
        let (mut cache, clock) = test_cache(10);
        cache.put("Oslo", Coordinate::new(59.9, 10.7));
        clock.advance(DEFAULT_TTL_MS - 10);
        cache.put("Oslo", Coordinate::new(59.9139, 10.7522));
        clock.advance(20);
        assert_eq!(cache.get("Oslo"), Some(Coordinate::new(59.9139, 10.7522)));
    }
}
