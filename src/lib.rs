//! Local Cache - a namespaced TTL cache over key/value storage
//!
//! Versioned invalidation, oldest-first eviction when storage runs out of
//! room, cache-backed HTTP fetch helpers, revalidating bindings and a small
//! HTTP service exposing the cache.

pub mod api;
pub mod bindings;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, Expiry, SharedCache};
pub use config::{CacheConfig, Config};
pub use tasks::spawn_maintenance_task;
