//! Bounded keyed memoization maps shared by every axiom's acceleration layer.
//!
//! Each cache tracks recency with a monotonically increasing tick. Under
//! [`Eviction::Lru`] a successful lookup refreshes the tick; under
//! [`Eviction::Fifo`] entries keep their insertion tick, so the oldest
//! insertion is dropped first.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Which entry goes first when a cache grows past its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    /// Least recently used (lookups refresh recency).
    Lru,
    /// First inserted (lookups do not reorder).
    Fifo,
}

/// A hash map with a hard entry limit and hit/miss accounting.
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    eviction: Eviction,
    entries: HashMap<K, (V, u64)>,
    order: BTreeMap<u64, K>,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl<K: Eq + Hash + Clone, V> BoundedCache<K, V> {
    pub fn new(capacity: usize, eviction: Eviction) -> Self {
        Self {
            capacity,
            eviction,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn lru(capacity: usize) -> Self {
        Self::new(capacity, Eviction::Lru)
    }

    pub fn fifo(capacity: usize) -> Self {
        Self::new(capacity, Eviction::Fifo)
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &K) {
        if self.eviction != Eviction::Lru {
            return;
        }
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(key) {
            let old = std::mem::replace(&mut entry.1, tick);
            if let Some(k) = self.order.remove(&old) {
                self.order.insert(tick, k);
            }
        }
    }

    /// Look up `key`, counting a hit or a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains_key(key) {
            self.misses += 1;
            return None;
        }
        self.hits += 1;
        self.touch(key);
        self.entries.get(key).map(|(v, _)| v)
    }

    /// Mutable lookup with the same accounting as [`BoundedCache::get`].
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if !self.entries.contains_key(key) {
            self.misses += 1;
            return None;
        }
        self.hits += 1;
        self.touch(key);
        self.entries.get_mut(key).map(|(v, _)| v)
    }

    /// Look up without touching statistics or recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(v, _)| v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace `key`, evicting old entries while over capacity.
    ///
    /// A zero-capacity cache stores nothing.
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.0 = value;
            self.touch(&key);
            return;
        }
        let tick = self.next_tick();
        self.order.insert(tick, key.clone());
        self.entries.insert(key, (value, tick));
        self.evict();
    }

    /// Insert only while the cache holds fewer than `capacity` entries.
    ///
    /// Returns whether the value was stored. Existing keys are never replaced.
    pub fn insert_if_room(&mut self, key: K, value: V) -> bool {
        if self.entries.len() >= self.capacity || self.entries.contains_key(&key) {
            return false;
        }
        self.insert(key, value);
        true
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            let Some((_, key)) = self.order.pop_first() else {
                break;
            };
            self.entries.remove(&key);
            log::trace!("evicted oldest entry (capacity {})", self.capacity);
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (value, tick) = self.entries.remove(key)?;
        self.order.remove(&tick);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Entries in eviction order (next victim first).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .values()
            .filter_map(move |k| self.entries.get_key_value(k).map(|(k, (v, _))| (k, v)))
    }

    /// Drop all entries and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v.clone();
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }
}

/// Snapshot of a cache layer's effectiveness.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    /// Entry counts per internal cache, by name.
    pub entries: BTreeMap<String, usize>,
}

impl CacheStats {
    pub fn new(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        Self {
            hits,
            misses,
            hit_rate,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entries(mut self, name: &str, count: usize) -> Self {
        self.entries.insert(name.to_string(), count);
        self
    }

    pub fn total_entries(&self) -> usize {
        self.entries.values().sum()
    }
}
