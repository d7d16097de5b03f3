//! Memoization Module
//!
//! Wraps arbitrary functions behind a [`BoundedStore`](crate::cache::BoundedStore).
//!
//! # Flow
//! - normalize the call's arguments into a JSON array
//! - keep the key-relevant prefix and derive a key from it
//! - return the stored outcome on a hit, otherwise run the function and store
//!   its outcome (pending outcomes are shared and evicted if they fail)

mod call;
mod memoized;
mod outcome;


pub use call::{identity_normalize, json_key, Call};
pub use memoized::{cachify, cachify_with, Memoized, MemoizedBuilder};
pub use outcome::{Outcome, PendingResult};
