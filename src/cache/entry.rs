//! Cache Entry Module
//!
//! Defines the stored envelope for individual cache entries with TTL support.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Serialized as `{"value": ..., "expiry": ..., "timestamp": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expiry: Option<u64>,
    /// Write timestamp (Unix milliseconds), used for eviction ordering
    pub timestamp: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry written at `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time-to-live; None = never expires
    /// * `now_ms` - Current time in Unix milliseconds
    pub fn new(value: T, ttl: Option<Duration>, now_ms: u64) -> Self {
        let expiry = ttl.map(|ttl| now_ms.saturating_add(ttl.as_millis() as u64));

        Self {
            value,
            expiry,
            timestamp: now_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry stays readable up to and including its expiry instant and is
    /// expired once the clock is strictly past it.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expiry {
            Some(expiry) => now_ms > expiry,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expiry.map(|expiry| expiry.saturating_sub(now_ms))
    }
}

// == Expiry ==
/// Expiration requested by a caller of `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Use the manager's configured default expiry
    #[default]
    Default,
    /// Never expire
    Never,
    /// Expire after the given duration; zero means the default
    After(Duration),
}

impl Expiry {
    /// Convenience constructor from milliseconds.
    pub fn millis(ms: u64) -> Self {
        Expiry::After(Duration::from_millis(ms))
    }

    /// Resolves against the configured default into an optional TTL.
    pub fn resolve(self, default_expiry: Duration) -> Option<Duration> {
        match self {
            Expiry::Default => Some(default_expiry),
            Expiry::Never => None,
            Expiry::After(ttl) if ttl.is_zero() => Some(default_expiry),
            Expiry::After(ttl) => Some(ttl),
        }
    }
}

impl From<Option<Duration>> for Expiry {
    /// `None` maps to `Never`, matching an explicit null expiry.
    fn from(ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) => Expiry::After(ttl),
            None => Expiry::Never,
        }
    }
}

impl From<Duration> for Expiry {
    fn from(ttl: Duration) -> Self {
        Expiry::After(ttl)
    }
}
