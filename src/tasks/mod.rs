//! Background Tasks Module
//!
//! Contains background tasks that keep a memoized function's store tidy.
//!
//! # Tasks
//! - Prune: Removes expired entries at a configured interval

mod prune;

pub use prune::spawn_prune_task;
