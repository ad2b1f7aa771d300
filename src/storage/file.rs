//! File-Backed Storage
//!
//! Keeps the item map in memory and rewrites a JSON file after every mutation,
//! so cached entries survive restarts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::{ItemMap, Storage};

// == File Storage ==
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    inner: Mutex<ItemMap>,
}

impl FileStorage {
    /// Opens (or creates on first write) the store at `path`.
    ///
    /// # Arguments
    /// * `path` - JSON file holding a string-to-string object
    /// * `quota` - Optional byte quota applied to writes
    pub fn open(path: impl AsRef<Path>, quota: Option<usize>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let items: BTreeMap<String, String> = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened file storage at {:?} with {} items", path, items.len());

        Ok(Self {
            path,
            inner: Mutex::new(ItemMap::from_items(items, quota)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes()
    }

    fn lock(&self) -> MutexGuard<'_, ItemMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Temp file + rename so a crash never leaves a half-written store.
    fn persist(&self, map: &ItemMap) -> Result<(), StorageError> {
        let raw = serde_json::to_string(map.items())?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.lock();
        let previous = map.get(key);
        map.insert(key, value)?;

        if let Err(err) = self.persist(&map) {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => {
                    if let Err(restore_err) = map.insert(key, &old) {
                        warn!("Failed to restore {} after persist error: {}", key, restore_err);
                    }
                }
                None => {
                    map.remove(key);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        let mut map = self.lock();
        if map.remove(key) {
            if let Err(err) = self.persist(&map) {
                warn!("Failed to persist removal of {}: {}", key, err);
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys()
    }
}
