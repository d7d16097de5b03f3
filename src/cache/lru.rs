//! Recency Module
//!
//! Keeps store keys in use order so the coldest one can be dropped at capacity.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

// == LRU Tracker ==
/// Use order of store keys, hottest first.
///
/// Every promotion stamps the key with a fresh tick; the ordered map from tick
/// to key gives the coldest key first. Promote, forget and pop are logarithmic,
/// so hits stay cheap in an unbounded store.
#[derive(Debug)]
pub struct LruTracker<K> {
    ticks: HashMap<K, u64>,
    order: BTreeMap<u64, K>,
    clock: u64,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self {
            ticks: HashMap::new(),
            order: BTreeMap::new(),
            clock: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> LruTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `key` to the hot end. Returns true if it was not tracked yet.
    pub fn promote(&mut self, key: K) -> bool {
        self.clock += 1;
        let fresh = match self.ticks.insert(key.clone(), self.clock) {
            Some(previous) => {
                self.order.remove(&previous);
                false
            }
            None => true,
        };
        self.order.insert(self.clock, key);
        fresh
    }

    /// Stops tracking `key`. Returns whether it was tracked.
    pub fn forget(&mut self, key: &K) -> bool {
        match self.ticks.remove(key) {
            Some(tick) => {
                self.order.remove(&tick);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the coldest key.
    pub fn pop_coldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
        self.order.clear();
    }

    /// Keys from hottest to coldest.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.values().rev()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
