//! Configuration Module
//!
//! Handles loading cache and service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default expiry applied when a caller does not choose one (24 hours).
pub const DEFAULT_EXPIRY_MS: u64 = 24 * 60 * 60 * 1000;
/// Default namespace for every cache key.
pub const DEFAULT_PREFIX: &str = "app_cache_";
/// Default schema version.
pub const DEFAULT_VERSION: &str = "1.0.0";
/// Default storage quota, the usual browser local storage allowance.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// == Cache Config ==
/// Settings of one cache manager. Immutable once the manager is built.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Expiry used when `set` is called with `Expiry::Default`
    pub default_expiry: Duration,
    /// Prefix namespacing all keys in the shared store
    pub key_prefix: String,
    /// Schema version; a stored marker with another value wipes the cache
    pub version: String,
}

impl CacheConfig {
    pub fn new(key_prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_default_expiry(mut self, default_expiry: Duration) -> Self {
        self.default_expiry = default_expiry;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expiry: Duration::from_millis(DEFAULT_EXPIRY_MS),
            key_prefix: DEFAULT_PREFIX.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

// == Config ==
/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache key prefix
    pub key_prefix: String,
    /// Cache schema version
    pub version: String,
    /// Default expiry in milliseconds
    pub default_expiry_ms: u64,
    /// Storage quota in bytes
    pub quota_bytes: usize,
    /// File backing the storage; None keeps everything in memory
    pub storage_path: Option<PathBuf>,
    /// HTTP server port
    pub server_port: u16,
    /// Maintenance task interval in seconds
    pub maintenance_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PREFIX` - Key prefix (default: app_cache_)
    /// - `CACHE_VERSION` - Schema version (default: 1.0.0)
    /// - `CACHE_DEFAULT_EXPIRY_MS` - Default expiry in ms (default: 86400000)
    /// - `CACHE_QUOTA_BYTES` - Storage quota (default: 5 MiB)
    /// - `CACHE_STORAGE_PATH` - JSON file for persistent storage (default: in-memory)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAINTENANCE_INTERVAL` - Sweep frequency in seconds (default: 3600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            key_prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.key_prefix),
            version: env::var("CACHE_VERSION").unwrap_or(defaults.version),
            default_expiry_ms: parse_var("CACHE_DEFAULT_EXPIRY_MS")
                .unwrap_or(defaults.default_expiry_ms),
            quota_bytes: parse_var("CACHE_QUOTA_BYTES").unwrap_or(defaults.quota_bytes),
            storage_path: env::var("CACHE_STORAGE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            maintenance_interval: parse_var("MAINTENANCE_INTERVAL")
                .unwrap_or(defaults.maintenance_interval),
        }
    }

    /// Builds the cache manager settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.key_prefix.clone(), self.version.clone())
            .with_default_expiry(Duration::from_millis(self.default_expiry_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_PREFIX.to_string(),
            version: DEFAULT_VERSION.to_string(),
            default_expiry_ms: DEFAULT_EXPIRY_MS,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            storage_path: None,
            server_port: 3000,
            maintenance_interval: 3600,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
