//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `PUT /cache/:key` - Store a JSON value
//! - `GET /cache/:key` - Retrieve a value
//! - `DELETE /cache/:key` - Remove a value
//! - `GET /cache/:key/exists` - Check for a live entry
//! - `POST /cache/clear` - Remove every entry
//! - `POST /cache/init` - Sweep expired entries and check the version
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
