//! Bounded Store Module
//!
//! Key-value container combining HashMap storage with LRU tracking and
//! max-age expiration.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::cache::{CacheStats, LruTracker, StoreEntry};
use crate::config::StoreOptions;

// == Bounded Store ==
/// Capacity-limited storage with LRU eviction and optional max-age.
#[derive(Debug)]
pub struct BoundedStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, StoreEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed, 0 = unbounded
    max: usize,
    /// Default max-age for entries stored without an explicit one
    max_age: Option<Duration>,
    /// Whether expired entries are served once before being dropped
    stale: bool,
}

impl<K, V> BoundedStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new store with the given capacity and default max-age.
    ///
    /// # Arguments
    /// * `max` - Maximum number of entries, 0 for no limit
    /// * `max_age` - Default lifetime of entries, None for no expiration
    pub fn new(max: usize, max_age: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max,
            max_age,
            stale: false,
        }
    }

    /// Creates a store from forwarded configuration options.
    pub fn from_options(options: &StoreOptions) -> Self {
        Self::new(options.max, options.max_age()).with_stale(options.stale)
    }

    pub fn with_stale(mut self, stale: bool) -> Self {
        self.stale = stale;
        self
    }

    // == Set ==
    /// Stores a key-value pair with the default max-age.
    ///
    /// If the key already exists, the value is overwritten and its age reset.
    /// If the store is at capacity, the least recently used entry is evicted.
    pub fn set(&mut self, key: K, value: V) {
        self.set_with_ttl(key, value, self.max_age);
    }

    /// Stores a key-value pair with an explicit max-age (None = never expires).
    pub fn set_with_ttl(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.max > 0 && self.entries.len() >= self.max {
            if let Some(evicted_key) = self.lru.pop_coldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
            }
        }

        self.lru.promote(key.clone());
        self.entries.insert(key, StoreEntry::new(value, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Expired entries are removed and counted as misses; with `stale` set the
    /// expired value is still returned this one time.
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.lookup(key) {
            Some(Lookup::Fresh(value)) => {
                self.stats.record_hit();
                self.lru.promote(key.clone());
                Some(value)
            }
            Some(Lookup::Expired(value)) => {
                self.stats.record_miss();
                value
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Retrieves a value by key without updating recency or statistics.
    ///
    /// Expired entries are dropped exactly as in [`BoundedStore::get`].
    pub fn peek(&mut self, key: &K) -> Option<V> {
        match self.lookup(key)? {
            Lookup::Fresh(value) => Some(value),
            Lookup::Expired(value) => value,
        }
    }

    // == Has ==
    /// Checks whether a live (non-expired) entry exists, without touching it.
    pub fn has(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Delete ==
    /// Removes an entry by key, returning its value if one was stored.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key)?;
        self.lru.forget(key);
        self.stats.set_total_entries(self.entries.len());
        Some(removed.value)
    }

    // == Reset ==
    /// Drops every entry. Statistics counters are kept.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    // == Prune ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self) -> usize {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.lru.forget(&key);
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Keys / Values ==
    /// Returns keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.lru.iter().cloned().collect()
    }

    /// Returns values from most to least recently used.
    pub fn values(&self) -> Vec<V> {
        self.lru
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| entry.value.clone())
            .collect()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub(crate) fn record_miss(&mut self) {
        self.stats.record_miss();
    }

    pub(crate) fn record_bypass(&mut self) {
        self.stats.record_bypass();
    }

    pub(crate) fn record_unwind(&mut self) {
        self.stats.record_unwind();
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included until pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity, 0 = unbounded.
    pub fn max(&self) -> usize {
        self.max
    }

    // Drops an expired entry on the way out; the stale value is kept only if allowed.
    fn lookup(&mut self, key: &K) -> Option<Lookup<V>> {
        let entry = self.entries.get(key)?;
        if !entry.is_expired() {
            return Some(Lookup::Fresh(entry.value.clone()));
        }

        let removed = self.delete(key);
        Some(Lookup::Expired(removed.filter(|_| self.stale)))
    }
}

enum Lookup<V> {
    Fresh(V),
    Expired(Option<V>),
}
