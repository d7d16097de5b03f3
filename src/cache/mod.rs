//! Bounded Store Module
//!
//! Provides the in-memory key-value store behind every memoized function:
//! LRU eviction with an optional per-entry max-age.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::StoreEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::BoundedStore;
