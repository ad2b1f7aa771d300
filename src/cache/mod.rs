//! Cache Module
//!
//! Namespaced TTL caching over a storage substrate, with version-based
//! invalidation and oldest-first eviction.

pub mod clock;
pub mod codec;
mod entry;
mod eviction;
mod manager;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, Expiry};
pub use eviction::{EvictionQueue, EVICTION_DIVISOR};
pub use manager::{CacheManager, InitReport, SharedCache, VERSION_KEY};
pub use stats::{CacheStats, StatsRecorder};
