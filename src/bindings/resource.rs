//! Cached Resource
//!
//! Binds a value to a cache entry and keeps it fresh: hydrated from the cache,
//! fetched when missing, revalidated on focus/reconnect events, with a
//! deduping window between fetches.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::bindings::events::{EventBus, RevalidationEvent, Subscription};
use crate::cache::{CacheManager, Expiry};
use crate::storage::{DynStorage, Storage};

/// Default minimum gap between two non-forced fetches.
pub const DEFAULT_DEDUPING_INTERVAL: Duration = Duration::from_secs(2);

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

// == Options ==
#[derive(Debug, Clone)]
pub struct ResourceOptions<T> {
    /// Expiry of the entries written after each successful fetch
    pub expiry: Expiry,
    /// Value used when the cache holds nothing
    pub initial_data: Option<T>,
    pub revalidate_on_focus: bool,
    pub revalidate_on_reconnect: bool,
    /// Non-forced fetches closer together than this are skipped
    pub deduping_interval: Duration,
}

impl<T> Default for ResourceOptions<T> {
    fn default() -> Self {
        Self {
            expiry: Expiry::Never,
            initial_data: None,
            revalidate_on_focus: true,
            revalidate_on_reconnect: true,
            deduping_interval: DEFAULT_DEDUPING_INTERVAL,
        }
    }
}

impl<T> ResourceOptions<T> {
    fn listens_to(&self, event: RevalidationEvent) -> bool {
        match event {
            RevalidationEvent::Focus => self.revalidate_on_focus,
            RevalidationEvent::Reconnect => self.revalidate_on_reconnect,
        }
    }
}

// == State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// What a consumer sees of a resource at one point in time.
#[derive(Debug, Clone)]
pub struct ResourceSnapshot<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<Arc<anyhow::Error>>,
    pub status: ResourceStatus,
}

/// Result of a fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetcher succeeded; data and cache updated
    Updated,
    /// Fetcher failed; error recorded, data kept
    Failed,
    /// Skipped because the previous fetch was too recent
    Deduped,
    /// Skipped because data was already present
    Skipped,
}

// == Cached Resource ==
/// Cheap to clone; clones share state.
pub struct CachedResource<T, S: Storage = DynStorage> {
    inner: Arc<ResourceInner<T, S>>,
}

struct ResourceInner<T, S: Storage> {
    cache: Arc<CacheManager<S>>,
    key: String,
    fetcher: Fetcher<T>,
    options: ResourceOptions<T>,
    state: watch::Sender<ResourceSnapshot<T>>,
    // Per-instance; a new resource for the same key starts a fresh window
    last_fetch_ms: Mutex<Option<u64>>,
}

impl<T, S: Storage> Clone for CachedResource<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, S> CachedResource<T, S>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    S: Storage + 'static,
{
    /// Creates a resource hydrated from the cache entry under `key`, falling
    /// back to `options.initial_data`. Nothing is fetched until `load`.
    pub fn new<F, Fut>(
        cache: Arc<CacheManager<S>>,
        key: impl Into<String>,
        fetcher: F,
        options: ResourceOptions<T>,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let key = key.into();
        let data = cache
            .get::<T>(&key)
            .or_else(|| options.initial_data.clone());
        let (state, _) = watch::channel(ResourceSnapshot {
            data,
            is_loading: false,
            error: None,
            status: ResourceStatus::Idle,
        });

        Self {
            inner: Arc::new(ResourceInner {
                cache,
                key,
                fetcher: Arc::new(move || fetcher().boxed()),
                options,
                state,
                last_fetch_ms: Mutex::new(None),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn snapshot(&self) -> ResourceSnapshot<T> {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.inner.state.borrow().data.clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<ResourceSnapshot<T>> {
        self.inner.state.subscribe()
    }

    /// Fetches if no data is present yet, subject to deduping.
    pub async fn load(&self) -> FetchOutcome {
        if self.inner.state.borrow().data.is_some() {
            return FetchOutcome::Skipped;
        }
        self.fetch(false).await
    }

    /// Fetches unless the previous fetch falls inside the deduping window.
    pub async fn revalidate(&self) -> FetchOutcome {
        self.fetch(false).await
    }

    /// Fetches regardless of the deduping window.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch(true).await
    }

    async fn fetch(&self, force: bool) -> FetchOutcome {
        let inner = &self.inner;
        let now = inner.cache.now_ms();
        {
            let mut last = inner
                .last_fetch_ms
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let window = inner.options.deduping_interval.as_millis() as u64;
            if let Some(last_ms) = *last {
                if !force && now.saturating_sub(last_ms) < window {
                    debug!("Deduped fetch of {}", inner.key);
                    return FetchOutcome::Deduped;
                }
            }
            *last = Some(now);
        }

        inner.state.send_modify(|state| {
            state.is_loading = true;
            state.status = ResourceStatus::Loading;
        });

        let result = (inner.fetcher)().await;

        match result {
            Ok(data) => {
                inner.cache.set(&inner.key, &data, inner.options.expiry);
                inner.state.send_modify(|state| {
                    state.data = Some(data);
                    state.error = None;
                    state.is_loading = false;
                    state.status = ResourceStatus::Success;
                });
                FetchOutcome::Updated
            }
            Err(err) => {
                warn!("Fetch of {} failed: {:#}", inner.key, err);
                inner.state.send_modify(|state| {
                    state.error = Some(Arc::new(err));
                    state.is_loading = false;
                    state.status = ResourceStatus::Error;
                });
                FetchOutcome::Failed
            }
        }
    }

    /// Revalidates on the bus events enabled in the options until the
    /// returned subscription is disposed or dropped.
    pub fn subscribe(&self, bus: &EventBus) -> Subscription {
        let options = &self.inner.options;
        if !options.revalidate_on_focus && !options.revalidate_on_reconnect {
            return Subscription::inactive();
        }

        let mut events = bus.subscribe();
        let resource = self.clone();
        Subscription::new(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if resource.inner.options.listens_to(event) => {
                        resource.revalidate().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!("Missed {} revalidation events for {}", missed, resource.key());
                        resource.revalidate().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }
}
