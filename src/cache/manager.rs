//! Cache Manager Module
//!
//! Main cache engine: namespaced, TTL-aware entries over a storage substrate,
//! with version-based invalidation and oldest-first eviction when the
//! substrate refuses a write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::codec;
use crate::cache::{CacheEntry, CacheStats, EvictionQueue, Expiry, StatsRecorder};
use crate::config::CacheConfig;
use crate::storage::{DynStorage, Storage};

/// Key (after the prefix) holding the raw version marker.
pub const VERSION_KEY: &str = "version";

/// Cache manager shared across the service.
pub type SharedCache = Arc<CacheManager<DynStorage>>;

// == Init Report ==
/// Outcome of an `init` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Expired or unparsable entries removed by the sweep
    pub swept: usize,
    /// Whether the version marker was missing or different
    pub version_reset: bool,
    /// Entries removed because of the version reset
    pub cleared: usize,
}

// == Cache Manager ==
/// Namespaced TTL cache over a storage substrate.
pub struct CacheManager<S: Storage = DynStorage> {
    /// Substrate holding the serialized entries
    storage: S,
    /// Prefix, version and default expiry
    config: CacheConfig,
    /// Time source for expiry and write timestamps
    clock: Arc<dyn Clock>,
    /// Set by the first `init`
    initialized: AtomicBool,
    /// Hit/miss/removal counters
    stats: StatsRecorder,
}

impl<S: Storage> CacheManager<S> {
    // == Constructor ==
    /// Creates a manager using the wall clock.
    ///
    /// Nothing touches storage until `init` runs, either explicitly or lazily
    /// on the first `set`, `get` or `has`.
    pub fn new(storage: S, config: CacheConfig) -> Self {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    /// Creates a manager with an explicit time source.
    pub fn with_clock(storage: S, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            config,
            clock,
            initialized: AtomicBool::new(false),
            stats: StatsRecorder::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current time according to the manager's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Init ==
    /// Sweeps expired entries, then wipes the cache if the stored version
    /// marker differs from the configured version.
    ///
    /// Safe to call repeatedly: once the versions match, later calls only sweep.
    pub fn init(&self) -> InitReport {
        if !self.storage.is_available() {
            return InitReport::default();
        }
        self.initialized.store(true, Ordering::SeqCst);

        let swept = self.sweep_expired();

        let stored_version = self.storage.get_item(&self.version_key());
        let version_reset = stored_version.as_deref() != Some(self.config.version.as_str());
        let cleared = if version_reset {
            info!(
                "Cache version changed from {:?} to {}, clearing cache",
                stored_version, self.config.version
            );
            self.clear_all()
        } else {
            0
        };

        InitReport {
            swept,
            version_reset,
            cleared,
        }
    }

    fn ensure_init(&self) {
        if !self.initialized.load(Ordering::SeqCst) {
            self.init();
        }
    }

    // == Set ==
    /// Stores a value under `key`, replacing any previous entry.
    ///
    /// Writes are best-effort. If the substrate refuses the write, the oldest
    /// fifth of the entries is evicted and the write retried once; a second
    /// failure is logged and dropped.
    ///
    /// Returns whether the entry was stored.
    pub fn set<T>(&self, key: &str, value: &T, expiry: impl Into<Expiry>) -> bool
    where
        T: Serialize + ?Sized,
    {
        if !self.storage.is_available() {
            return false;
        }
        if key == VERSION_KEY {
            warn!("Refusing to overwrite reserved cache key {}", key);
            return false;
        }
        self.ensure_init();

        let ttl = expiry.into().resolve(self.config.default_expiry);
        let entry = CacheEntry::new(value, ttl, self.clock.now_ms());
        let raw = match codec::encode_entry(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                error!("Cache encode error for {}: {}", key, err);
                self.stats.record_write_failure();
                return false;
            }
        };

        let prefixed_key = self.prefixed_key(key);
        if let Err(err) = self.storage.set_item(&prefixed_key, &raw) {
            warn!("Cache storage error for {}: {}", key, err);

            let evicted = self.evict_oldest();
            debug!("Evicted {} entries before retrying {}", evicted, key);

            if let Err(retry_err) = self.storage.set_item(&prefixed_key, &raw) {
                error!("Cache storage retry failed for {}: {}", key, retry_err);
                self.stats.record_write_failure();
                return false;
            }
        }
        true
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns None when the key is absent, expired, unparsable or holds a
    /// value of another type. Expired and unparsable entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.storage.is_available() || key == VERSION_KEY {
            return None;
        }
        self.ensure_init();

        let Some(entry) = self.read_live_entry(key) else {
            self.stats.record_miss();
            return None;
        };

        match codec::decode_value(entry.value) {
            Ok(value) => {
                self.stats.record_hit();
                Some(value)
            }
            Err(err) => {
                // Another reader may hold the right type; leave the entry alone
                warn!("Cache parse error for {}: {}", key, err);
                self.stats.record_miss();
                None
            }
        }
    }

    /// Like `get`, returning `default` on a miss.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    // == Has ==
    /// Checks whether a live entry exists under `key`, removing it if it
    /// turns out to be expired or unparsable.
    pub fn has(&self, key: &str) -> bool {
        if !self.storage.is_available() || key == VERSION_KEY {
            return false;
        }
        self.ensure_init();

        self.read_live_entry(key).is_some()
    }

    // == Remove ==
    /// Deletes the entry under `key`. Absent keys are ignored.
    pub fn remove(&self, key: &str) {
        if !self.storage.is_available() || key == VERSION_KEY {
            return;
        }
        self.storage.remove_item(&self.prefixed_key(key));
    }

    // == Clear All ==
    /// Removes every entry under the prefix and rewrites the version marker
    /// with the configured version.
    ///
    /// Returns the number of entries removed.
    pub fn clear_all(&self) -> usize {
        if !self.storage.is_available() {
            return 0;
        }

        let keys = self.owned_keys();
        let count = keys.len();
        for key in &keys {
            self.storage.remove_item(key);
        }

        if let Err(err) = self
            .storage
            .set_item(&self.version_key(), &self.config.version)
        {
            error!("Failed to write cache version marker: {}", err);
        }

        debug!("Cleared {} cache entries", count);
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of live entries under the prefix.
    ///
    /// Expired and unparsable entries are skipped but left in place.
    pub fn len(&self) -> usize {
        if !self.storage.is_available() {
            return 0;
        }
        let now = self.clock.now_ms();
        self.owned_keys()
            .iter()
            .filter_map(|key| self.storage.get_item(key))
            .filter(|raw| {
                codec::decode_envelope(raw)
                    .map(|entry| !entry.is_expired_at(now))
                    .unwrap_or(false)
            })
            .count()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage key for a cache key.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Storage key of the version marker.
    pub fn version_key(&self) -> String {
        self.prefixed_key(VERSION_KEY)
    }

    // Every storage key under the prefix except the version marker.
    fn owned_keys(&self) -> Vec<String> {
        let version_key = self.version_key();
        self.storage
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&self.config.key_prefix) && *key != version_key)
            .collect()
    }

    // Reads the envelope under `key`, removing it if expired or unparsable.
    fn read_live_entry(&self, key: &str) -> Option<CacheEntry<Value>> {
        let prefixed_key = self.prefixed_key(key);
        let raw = self.storage.get_item(&prefixed_key)?;

        let entry = match codec::decode_envelope(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Removing malformed cache entry {}: {}", key, err);
                self.storage.remove_item(&prefixed_key);
                self.stats.record_malformed(1);
                return None;
            }
        };

        if entry.is_expired_at(self.clock.now_ms()) {
            debug!("Cache entry {} expired", key);
            self.storage.remove_item(&prefixed_key);
            self.stats.record_expired(1);
            return None;
        }

        Some(entry)
    }

    // == Cleanup Expired ==
    // Removes expired and unparsable entries. Returns the number removed.
    fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut expired = 0;
        let mut malformed = 0;

        for key in self.owned_keys() {
            let Some(raw) = self.storage.get_item(&key) else {
                continue;
            };
            match codec::decode_envelope(&raw) {
                Ok(entry) if entry.is_expired_at(now) => {
                    self.storage.remove_item(&key);
                    expired += 1;
                }
                Ok(_) => {}
                Err(_) => {
                    self.storage.remove_item(&key);
                    malformed += 1;
                }
            }
        }

        self.stats.record_expired(expired as u64);
        self.stats.record_malformed(malformed as u64);
        expired + malformed
    }

    // == Evict Oldest ==
    // Removes the oldest fifth of entries by write time. Returns the number removed.
    fn evict_oldest(&self) -> usize {
        let queue: EvictionQueue = self
            .owned_keys()
            .into_iter()
            .filter_map(|key| {
                let raw = self.storage.get_item(&key)?;
                let timestamp = codec::timestamp_of(&raw);
                Some((key, timestamp))
            })
            .collect();

        let victims = queue.take_oldest();
        for key in &victims {
            self.storage.remove_item(key);
        }

        self.stats.record_evictions(victims.len() as u64);
        victims.len()
    }
}
