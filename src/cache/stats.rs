//! Statistics Module
//!
//! Counters for the store and for the memoized calls that go through it.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of store and memoization counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries pushed out by the capacity limit
    pub evictions: u64,
    /// Calls made while caching was disabled
    pub bypassed: u64,
    /// Entries dropped because their pending result failed
    pub unwound: u64,
    /// Entries currently held, expired ones included until pruned
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lookups that reached the store.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// hits / lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn record_bypass(&mut self) {
        self.bypassed += 1;
    }

    pub(crate) fn record_unwind(&mut self) {
        self.unwound += 1;
    }

    pub(crate) fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
