//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheManager, SharedCache};
use crate::config::Config;
use crate::error::{ApiError, Result, StorageError};
use crate::models::{
    validate_key, ClearResponse, DeleteResponse, ExistsResponse, GetResponse, HealthResponse,
    InitResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::storage::{DynStorage, FileStorage, MemoryStorage, Storage};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
}

impl AppState {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    /// Builds the storage substrate and cache manager described by `config`.
    ///
    /// A configured storage path selects the file substrate; otherwise
    /// entries live in memory under the configured quota.
    pub fn from_config(config: &Config) -> std::result::Result<Self, StorageError> {
        let storage: DynStorage = match &config.storage_path {
            Some(path) => Arc::new(FileStorage::open(path, Some(config.quota_bytes))?),
            None => Arc::new(MemoryStorage::with_quota(config.quota_bytes)),
        };
        let cache = CacheManager::new(storage, config.cache_config());
        Ok(Self::new(Arc::new(cache)))
    }
}

/// Handler for PUT /cache/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = validate_key(&key).or_else(|| req.validate()) {
        return Err(ApiError::InvalidRequest(error_msg));
    }
    if !state.cache.storage().is_available() {
        return Err(ApiError::Internal("Storage unavailable".to_string()));
    }

    if !state.cache.set(&key, &req.value, req.expiry()) {
        return Err(ApiError::InsufficientStorage(format!(
            "Key '{}' could not be stored",
            key
        )));
    }
    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get::<Value>(&key)
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /cache/:key/exists
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ExistsResponse> {
    let exists = state.cache.has(&key);
    Json(ExistsResponse { key, exists })
}

/// Handler for DELETE /cache/:key
///
/// Succeeds whether or not the key was present.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.remove(&key);
    Json(DeleteResponse::new(key))
}

/// Handler for POST /cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.clear_all();
    debug!("Cleared {} entries on request", removed);
    Json(ClearResponse::new(removed))
}

/// Handler for POST /cache/init
pub async fn init_handler(State(state): State<AppState>) -> Json<InitResponse> {
    Json(state.cache.init().into())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.cache.storage().is_available()))
}
