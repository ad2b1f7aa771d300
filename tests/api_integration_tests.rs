//! Integration Tests for API Endpoints
//!
//! Full request/response cycles through the router.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use local_cache::{
    api::create_router,
    cache::CacheManager,
    config::{CacheConfig, Config},
    storage::{DynStorage, MemoryStorage, Storage},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(test_state(Arc::new(MemoryStorage::new()), "1.0.0"))
}

fn test_state(storage: DynStorage, version: &str) -> AppState {
    let config = CacheConfig::new("app_cache_", version);
    AppState::new(Arc::new(CacheManager::new(storage, config)))
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// == SET / GET ==

#[tokio::test]
async fn test_set_then_get_round_trips_json() {
    let app = create_test_app();
    let value = json!({"posts": [{"id": 1, "title": "Hello"}], "total": 1});

    let (status, body) = send(&app, put_json("/cache/posts", json!({"value": value}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("posts"));

    let (status, body) = send(&app, request("GET", "/cache/posts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "posts");
    assert_eq!(body["value"], value);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let (status, body) = send(&app, request("GET", "/cache/nonexistent_key")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nonexistent_key"));
}

#[tokio::test]
async fn test_set_with_expiry_then_expires() {
    let app = create_test_app();

    send(&app, put_json("/cache/flash", json!({"value": "soon gone", "expiry_ms": 50}))).await;
    let (status, _) = send(&app, request("GET", "/cache/flash")).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, _) = send(&app, request("GET", "/cache/flash")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_invalid_requests() {
    let app = create_test_app();

    let (status, body) = send(&app, put_json("/cache/version", json!({"value": "9.9.9"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("reserved"));

    let (status, _) = send(
        &app,
        put_json("/cache/k", json!({"value": 1, "persistent": true, "expiry_ms": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_malformed_body() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/cache/k")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == EXISTS / DELETE ==

#[tokio::test]
async fn test_exists_and_delete() {
    let app = create_test_app();
    send(&app, put_json("/cache/theme", json!({"value": "dark", "persistent": true}))).await;

    let (_, body) = send(&app, request("GET", "/cache/theme/exists")).await;
    assert_eq!(body, json!({"key": "theme", "exists": true}));

    let (status, body) = send(&app, request("DELETE", "/cache/theme")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "theme");

    let (_, body) = send(&app, request("GET", "/cache/theme/exists")).await;
    assert_eq!(body["exists"], false);

    // Deleting an absent key is not an error
    let (status, _) = send(&app, request("DELETE", "/cache/theme")).await;
    assert_eq!(status, StatusCode::OK);
}

// == CLEAR / INIT ==

#[tokio::test]
async fn test_clear_removes_everything_under_prefix() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_router(test_state(storage.clone(), "1.0.0"));
    for key in ["a", "b", "c"] {
        send(&app, put_json(&format!("/cache/{}", key), json!({"value": key}))).await;
    }
    storage.set_item("unrelated", "kept").unwrap();

    let (status, body) = send(&app, request("POST", "/cache/clear")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 3);

    let (_, body) = send(&app, request("GET", "/stats")).await;
    assert_eq!(body["total_entries"], 0);
    assert_eq!(storage.get_item("unrelated").as_deref(), Some("kept"));
}

#[tokio::test]
async fn test_version_change_wipes_cache() {
    let storage: DynStorage = Arc::new(MemoryStorage::new());

    let v1 = create_router(test_state(storage.clone(), "1.0.0"));
    send(&v1, put_json("/cache/posts", json!({"value": [1, 2, 3]}))).await;

    let v2 = create_router(test_state(storage, "2.0.0"));
    let (status, body) = send(&v2, request("POST", "/cache/init")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wiped"], true);
    assert_eq!(body["cleared"], 1);

    let (status, _) = send(&v2, request("GET", "/cache/posts")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&v2, request("POST", "/cache/init")).await;
    assert_eq!(body["wiped"], false);
}

// == Quota ==

#[tokio::test]
async fn test_full_storage_evicts_oldest_entries() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_router(test_state(storage.clone(), "1.0.0"));

    for i in 0..10 {
        send(
            &app,
            put_json(&format!("/cache/item{}", i), json!({"value": "x".repeat(100)})),
        )
        .await;
        // Distinct write timestamps
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    // No room for one more entry of the same size
    storage.set_quota(Some(storage.used_bytes()));
    let (status, _) = send(&app, put_json("/cache/item10", json!({"value": "x".repeat(100)}))).await;
    assert_eq!(status, StatusCode::OK);

    for i in [0, 1] {
        let (status, _) = send(&app, request("GET", &format!("/cache/item{}", i))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "item{} should be evicted", i);
    }
    for i in 2..=10 {
        let (status, _) = send(&app, request("GET", &format!("/cache/item{}", i))).await;
        assert_eq!(status, StatusCode::OK, "item{} should survive", i);
    }

    let (_, body) = send(&app, request("GET", "/stats")).await;
    assert_eq!(body["evictions"], 2);
}

#[tokio::test]
async fn test_write_refused_after_eviction_is_an_error() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_router(test_state(storage.clone(), "1.0.0"));
    send(&app, request("POST", "/cache/init")).await;

    // Nothing to evict and no room left
    storage.set_quota(Some(storage.used_bytes()));
    let (status, body) = send(&app, put_json("/cache/big", json!({"value": "x".repeat(1000)}))).await;
    assert_eq!(status, StatusCode::INSUFFICIENT_STORAGE);
    assert!(body["error"].as_str().unwrap().contains("big"));

    let (status, _) = send(&app, request("GET", "/cache/big")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, request("GET", "/stats")).await;
    assert_eq!(body["write_failures"], 1);
}

// == Reserved Keys ==

#[tokio::test]
async fn test_route_names_are_reserved_keys() {
    let app = create_test_app();

    for key in ["clear", "init", "version"] {
        let (status, _) = send(&app, put_json(&format!("/cache/{}", key), json!({"value": 1}))).await;
        assert_ne!(status, StatusCode::OK, "{} should not be storable", key);
    }
}

// == STATS / HEALTH ==

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let app = create_test_app();
    send(&app, put_json("/cache/k", json!({"value": 1}))).await;

    send(&app, request("GET", "/cache/k")).await;
    send(&app, request("GET", "/cache/k")).await;
    send(&app, request("GET", "/cache/missing")).await;

    let (status, body) = send(&app, request("GET", "/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hits"], 2);
    assert_eq!(body["misses"], 1);
    assert_eq!(body["total_entries"], 1);
    let hit_rate = body["hit_rate"].as_f64().unwrap();
    assert!((hit_rate - 2.0 / 3.0).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(&create_test_app(), request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

// == File-Backed Service ==

#[tokio::test]
async fn test_file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        storage_path: Some(dir.path().join("cache.json")),
        ..Config::default()
    };

    let app = create_router(AppState::from_config(&config).unwrap());
    send(&app, put_json("/cache/session", json!({"value": {"user": "amal"}, "persistent": true}))).await;
    drop(app);

    let restarted = create_router(AppState::from_config(&config).unwrap());
    let (status, body) = send(&restarted, request("GET", "/cache/session")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!({"user": "amal"}));
}
