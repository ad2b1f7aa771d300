//! Request DTOs for the cache service API

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{Expiry, VERSION_KEY};

pub const MAX_KEY_LENGTH: usize = 256;

/// Keys shadowed by the static `/cache/clear` and `/cache/init` routes, plus
/// the version marker.
pub const RESERVED_KEYS: [&str; 3] = ["clear", "init", VERSION_KEY];

/// Checks a key taken from the request path.
///
/// Returns an error message if the key cannot be stored, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    if RESERVED_KEYS.contains(&key) {
        return Some(format!("Key '{}' is reserved", key));
    }
    None
}

/// Request body for `PUT /cache/:key`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// Any JSON value
    pub value: Value,
    /// Expiry in milliseconds; absent or zero uses the configured default
    #[serde(default)]
    pub expiry_ms: Option<u64>,
    /// Never expire
    #[serde(default)]
    pub persistent: bool,
}

impl SetRequest {
    pub fn validate(&self) -> Option<String> {
        if self.persistent && self.expiry_ms.is_some() {
            return Some("A persistent entry cannot have an expiry".to_string());
        }
        None
    }

    pub fn expiry(&self) -> Expiry {
        match (self.persistent, self.expiry_ms) {
            (true, _) => Expiry::Never,
            (false, Some(ms)) => Expiry::After(Duration::from_millis(ms)),
            (false, None) => Expiry::Default,
        }
    }
}
