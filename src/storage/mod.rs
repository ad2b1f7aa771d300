//! Storage Module
//!
//! The synchronous, string-keyed, quota-limited substrate the cache persists into.
//! The cache only owns keys carrying its prefix; other keys in the same store are
//! left alone.

mod file;
mod memory;

use std::sync::Arc;

use crate::error::StorageError;

pub use file::FileStorage;
pub use memory::{ItemMap, MemoryStorage};

// == Storage Trait ==
/// A key/value store with the semantics of browser local storage.
pub trait Storage: Send + Sync {
    /// Whether the substrate can be used at all. When `false`, every cache
    /// operation degrades to a no-op or returns its default.
    fn is_available(&self) -> bool {
        true
    }

    /// Returns the raw string stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Absent keys are ignored.
    fn remove_item(&self, key: &str);

    /// Lists every key currently in the store.
    fn keys(&self) -> Vec<String>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}

/// Type-erased storage handle used by the service's composition root.
pub type DynStorage = Arc<dyn Storage>;

// == Unavailable Storage ==
/// Substrate for environments without local storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl Storage for UnavailableStorage {
    fn is_available(&self) -> bool {
        false
    }

    fn get_item(&self, _key: &str) -> Option<String> {
        None
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove_item(&self, _key: &str) {}

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}
