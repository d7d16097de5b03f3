//! Configuration Module
//!
//! Handles loading cache configuration from environment variables or any
//! serde source.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// == Store Options ==
/// Settings forwarded verbatim to the bounded store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Maximum number of entries, 0 = unbounded
    pub max: usize,
    /// Default max-age in milliseconds for new entries, None = never expire
    pub max_age_ms: Option<u64>,
    /// Return an expired entry once (then drop it) instead of reporting a miss
    pub stale: bool,
}

impl StoreOptions {
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_ms.map(Duration::from_millis)
    }
}

// == Key Length ==
/// How many leading normalized arguments participate in key derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyLength {
    /// Every normalized argument is part of the key
    #[default]
    Unbounded,
    /// Only the first `n` normalized arguments are part of the key
    Limited(usize),
}

impl KeyLength {
    /// Returns the end of the key-relevant slice for an argument list of `len`.
    pub fn slice_end(&self, len: usize) -> usize {
        match self {
            KeyLength::Unbounded => len,
            KeyLength::Limited(n) => (*n).min(len),
        }
    }

    /// Parses an untyped value with integer-prefix semantics.
    ///
    /// Numbers are truncated, strings use their leading integer, and anything
    /// without a numeric prefix is unbounded. Negative values clamp to zero.
    pub fn parse_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    KeyLength::Limited(usize::try_from(u).unwrap_or(usize::MAX))
                } else if n.as_i64().is_some() {
                    KeyLength::Limited(0)
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() && f >= 0.0 => KeyLength::Limited(f.trunc() as usize),
                        Some(f) if f.is_finite() => KeyLength::Limited(0),
                        _ => KeyLength::Unbounded,
                    }
                }
            }
            Value::String(s) => Self::parse_str(s),
            _ => KeyLength::Unbounded,
        }
    }

    /// Parses the leading integer of a string (`"2abc"` -> 2, `"abc"` -> unbounded).
    ///
    /// Negative lengths clamp to 0, so every call shares the empty key. They do
    /// not count from the end ("all but the last n arguments").
    pub fn parse_str(input: &str) -> Self {
        let trimmed = input.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..digits_end];

        if digits.is_empty() {
            return KeyLength::Unbounded;
        }
        if negative {
            return KeyLength::Limited(0);
        }
        // Overflowing prefixes are as good as unbounded
        KeyLength::Limited(digits.parse().unwrap_or(usize::MAX))
    }
}

impl From<usize> for KeyLength {
    fn from(n: usize) -> Self {
        KeyLength::Limited(n)
    }
}

impl<'de> Deserialize<'de> for KeyLength {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(KeyLength::parse_value(&raw))
    }
}

// == Cache Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Bounded store settings
    #[serde(flatten)]
    pub store: StoreOptions,
    /// Cap on key-relevant arguments
    pub length: KeyLength,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHIFY_MAX` - Maximum entries (default: 0, unbounded)
    /// - `CACHIFY_MAX_AGE_MS` - Entry max-age in milliseconds (default: none)
    /// - `CACHIFY_STALE` - Serve expired entries once (default: false)
    /// - `CACHIFY_KEY_LENGTH` - Key-relevant argument count (default: unbounded)
    pub fn from_env() -> Self {
        Self {
            store: StoreOptions {
                max: env::var("CACHIFY_MAX")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0),
                max_age_ms: env::var("CACHIFY_MAX_AGE_MS")
                    .ok()
                    .and_then(|v| v.trim().parse().ok()),
                stale: env::var("CACHIFY_STALE")
                    .ok()
                    .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
            length: env::var("CACHIFY_KEY_LENGTH")
                .map(|v| KeyLength::parse_str(&v))
                .unwrap_or_default(),
        }
    }
}
