//! In-Memory Storage
//!
//! A process-local string map with optional byte quota.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;
use crate::storage::Storage;

// == Item Map ==
/// String map with quota accounting, shared by the in-memory and file substrates.
///
/// Usage is counted as the byte length of every key plus its value.
#[derive(Debug, Default, Clone)]
pub struct ItemMap {
    items: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl ItemMap {
    pub fn new(quota: Option<usize>) -> Self {
        Self {
            items: BTreeMap::new(),
            quota,
        }
    }

    pub fn from_items(items: BTreeMap<String, String>, quota: Option<usize>) -> Self {
        Self { items, quota }
    }

    pub fn items(&self) -> &BTreeMap<String, String> {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    /// Inserts an item, refusing writes that would push usage past the quota.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let replaced = self
                .items
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let used = self.used_bytes() - replaced;
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    needed,
                    used,
                    quota,
                });
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.items.remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn quota(&self) -> Option<usize> {
        self.quota
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }
}

// == Memory Storage ==
/// Thread-safe in-memory substrate.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<ItemMap>,
}

impl MemoryStorage {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store refusing writes beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Mutex::new(ItemMap::new(Some(quota))),
        }
    }

    /// Changes the quota. Existing items are kept even if they exceed it.
    pub fn set_quota(&self, quota: Option<usize>) {
        self.lock().set_quota(quota);
    }

    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes()
    }

    pub fn len(&self) -> usize {
        self.lock().items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, ItemMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key, value)
    }

    fn remove_item(&self, key: &str) {
        self.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys()
    }
}
