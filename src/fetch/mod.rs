//! Fetch Module
//!
//! Cache-backed helpers for asynchronous producers and HTTP requests.
//!
//! # Components
//! - `cached_fetch`: serve from cache, otherwise run a producer and store its result
//! - `cached_api_request`: `cached_fetch` keyed by URL and request options
//! - `ApiClient`: JSON API client whose `GET`s go through the cache

mod client;
mod helpers;

pub use client::{ApiClient, DEFAULT_GET_EXPIRY};
pub use helpers::{api_cache_key, cached_api_request, cached_fetch, send_request, RequestOptions};
