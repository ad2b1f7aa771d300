//! API Client
//!
//! JSON client for the site's backend. `GET` responses are cached; writes go
//! straight to the network.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheManager, Expiry};
use crate::error::FetchError;
use crate::fetch::helpers::{api_cache_key, cached_api_request, send_request, RequestOptions};
use crate::storage::{DynStorage, Storage};

/// Expiry applied to cached `GET` responses unless the caller picks one.
pub const DEFAULT_GET_EXPIRY: Duration = Duration::from_secs(30 * 60);

// == API Client ==
pub struct ApiClient<S: Storage = DynStorage> {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<CacheManager<S>>,
}

impl<S: Storage> ApiClient<S> {
    /// Creates a client resolving relative endpoints against `base_url`.
    pub fn new(base_url: impl Into<String>, cache: Arc<CacheManager<S>>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, cache)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        cache: Arc<CacheManager<S>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// Absolute URLs pass through; anything else lives under `{base}/api/`.
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            endpoint.to_string()
        } else {
            format!(
                "{}/api/{}",
                self.base_url,
                endpoint.trim_start_matches('/')
            )
        }
    }

    fn json_options(method: &str) -> RequestOptions {
        RequestOptions::new(method).header("Content-Type", "application/json")
    }

    // == Get ==
    /// Cached `GET` with the default 30 minute expiry.
    pub async fn get<T>(&self, endpoint: &str) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.get_with(endpoint, RequestOptions::get(), DEFAULT_GET_EXPIRY)
            .await
    }

    /// Cached `GET` with extra options and an explicit expiry.
    pub async fn get_with<T>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        expiry: impl Into<Expiry>,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
    {
        let url = self.resolve(endpoint);
        let options = Self::json_options("GET").merged_with(options);
        cached_api_request(&self.cache, &self.http, &url, &options, expiry).await
    }

    // == Writes ==
    pub async fn post<T, D>(&self, endpoint: &str, data: &D) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        self.send_json("POST", endpoint, Some(serde_json::to_value(data)?))
            .await
    }

    pub async fn put<T, D>(&self, endpoint: &str, data: &D) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        self.send_json("PUT", endpoint, Some(serde_json::to_value(data)?))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        self.send_json("DELETE", endpoint, None).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, FetchError> {
        let url = self.resolve(endpoint);
        let mut options = Self::json_options(method);
        options.body = body;

        let response = send_request(&self.http, &url, &options).await?;
        Ok(response.json::<T>().await?)
    }

    // == Invalidate ==
    /// Drops the cached response that `get(endpoint)` would serve.
    pub fn invalidate_cache(&self, endpoint: &str) -> Result<(), FetchError> {
        let url = self.resolve(endpoint);
        let key = api_cache_key(&url, &Self::json_options("GET"))?;
        debug!("Invalidating cached response for {}", url);
        self.cache.remove(&key);
        Ok(())
    }
}
