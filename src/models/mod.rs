//! Request and Response models for the cache service API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{validate_key, SetRequest, MAX_KEY_LENGTH, RESERVED_KEYS};
pub use responses::{
    ClearResponse, DeleteResponse, ErrorResponse, ExistsResponse, GetResponse, HealthResponse,
    InitResponse, SetResponse, StatsResponse,
};
