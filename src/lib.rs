//! LRU Cachify - memoize function calls behind a bounded LRU store
//!
//! Arguments are normalized and turned into a cache key; repeated calls with
//! the same key return the stored outcome. Pending asynchronous outcomes are
//! stored too, so concurrent callers share one computation, and are evicted
//! again if they fail.

pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod tasks;

pub use config::{CacheConfig, KeyLength, StoreOptions};
pub use error::{CachifyError, Result};
pub use memo::{cachify, cachify_with, Call, Memoized, MemoizedBuilder, Outcome};
pub use tasks::spawn_prune_task;

#[doc(hidden)]
pub use serde_json;
