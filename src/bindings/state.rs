//! Cached State
//!
//! A local value mirrored into the cache on every write, so it survives a
//! restart when the cache is backed by persistent storage.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheManager, Expiry};
use crate::storage::{DynStorage, Storage};

pub struct CachedState<T, S: Storage = DynStorage> {
    cache: Arc<CacheManager<S>>,
    key: String,
    value: T,
    expiry: Expiry,
}

impl<T, S> CachedState<T, S>
where
    T: Serialize + DeserializeOwned,
    S: Storage,
{
    /// Hydrates from the entry under `key`, or falls back to `initial`.
    /// Either way the current value is written back to the cache.
    pub fn new(
        cache: Arc<CacheManager<S>>,
        key: impl Into<String>,
        initial: T,
        expiry: impl Into<Expiry>,
    ) -> Self {
        let key = key.into();
        let expiry = expiry.into();
        let value = cache.get::<T>(&key).unwrap_or(initial);
        cache.set(&key, &value, expiry);

        Self {
            cache,
            key,
            value,
            expiry,
        }
    }

    /// Same as `new` with entries that never expire.
    pub fn persistent(cache: Arc<CacheManager<S>>, key: impl Into<String>, initial: T) -> Self {
        Self::new(cache, key, initial, Expiry::Never)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.write_back();
    }

    /// Applies `f` to the current value and stores the result.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) {
        self.value = f(&self.value);
        self.write_back();
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    fn write_back(&self) {
        self.cache.set(&self.key, &self.value, self.expiry);
    }
}
