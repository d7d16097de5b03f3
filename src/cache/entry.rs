//! Store Entry Module
//!
//! Defines the structure for individual store entries with max-age support.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

// == Store Entry ==
/// Represents a single store entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> StoreEntry<V> {
    // == Constructor ==
    /// Creates a new entry with an optional max-age.
    ///
    /// A max-age too large to be represented is treated as no expiration.
    pub fn new(value: V, max_age: Option<Duration>) -> Self {
        let now = Utc::now();
        let expires_at = max_age
            .and_then(|age| TimeDelta::from_std(age).ok())
            .and_then(|delta| now.checked_add_signed(delta));

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() >= expires,
            None => false,
        }
    }
}
