//! Cache-Backed Fetch Helpers

use std::collections::BTreeMap;
use std::future::Future;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheManager, Expiry};
use crate::error::FetchError;
use crate::storage::Storage;

// == Cached Fetch ==
/// Returns the cached value for `key`, or runs `fetch_fn`, caches its result
/// and returns it.
///
/// Producer errors propagate unchanged and nothing is cached. Concurrent
/// misses on the same key each run their producer; the last write wins.
pub async fn cached_fetch<S, T, E, F, Fut>(
    cache: &CacheManager<S>,
    key: &str,
    fetch_fn: F,
    expiry: impl Into<Expiry>,
) -> Result<T, E>
where
    S: Storage,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(cached) = cache.get::<T>(key) {
        debug!("Cache hit for {}", key);
        return Ok(cached);
    }

    debug!("Cache miss for {}, fetching", key);
    let data = fetch_fn().await?;
    cache.set(key, &data, expiry);
    Ok(data)
}

// == Request Options ==
/// Request settings that take part in the cache key of an API request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestOptions {
    /// HTTP method
    pub method: String,
    /// Request headers; ordered so the derived cache key is stable
    pub headers: BTreeMap<String, String>,
    /// Optional JSON body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new("GET")
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Layers `other` on top of `self`: its method and body replace ours and
    /// its headers override same-named ones.
    pub fn merged_with(mut self, other: RequestOptions) -> Self {
        self.method = other.method;
        self.headers.extend(other.headers);
        if other.body.is_some() {
            self.body = other.body;
        }
        self
    }
}

/// Cache key for an API request: `api_{url}_{options as JSON}`.
pub fn api_cache_key(url: &str, options: &RequestOptions) -> Result<String, FetchError> {
    Ok(format!("api_{}_{}", url, serde_json::to_string(options)?))
}

// == Send Request ==
/// Performs an HTTP request, failing with `FetchError::Status` on non-2xx.
pub async fn send_request(
    http: &reqwest::Client,
    url: &str,
    options: &RequestOptions,
) -> Result<reqwest::Response, FetchError> {
    let method = Method::from_bytes(options.method.to_uppercase().as_bytes())
        .map_err(|_| FetchError::InvalidMethod(options.method.clone()))?;

    let mut request = http.request(method, url);
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &options.body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response)
}

// == Cached API Request ==
/// `cached_fetch` for a JSON HTTP endpoint, keyed by URL and options.
pub async fn cached_api_request<S, T>(
    cache: &CacheManager<S>,
    http: &reqwest::Client,
    url: &str,
    options: &RequestOptions,
    expiry: impl Into<Expiry>,
) -> Result<T, FetchError>
where
    S: Storage,
    T: Serialize + DeserializeOwned,
{
    let key = api_cache_key(url, options)?;

    cached_fetch(
        cache,
        &key,
        move || async move {
            let response = send_request(http, url, options).await?;
            Ok::<T, FetchError>(response.json::<T>().await?)
        },
        expiry,
    )
    .await
}
