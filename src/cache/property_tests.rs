//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache's behavioural properties over generated inputs.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{codec, CacheManager, Expiry, ManualClock};
use crate::config::CacheConfig;
use crate::storage::{MemoryStorage, Storage};

// == Test Configuration ==
const START_MS: u64 = 1_700_000_000_000;

type TestCache = CacheManager<Arc<MemoryStorage>>;

fn test_cache() -> (TestCache, Arc<MemoryStorage>, Arc<ManualClock>) {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(START_MS));
    let cache = CacheManager::with_clock(storage.clone(), CacheConfig::default(), clock.clone());
    (cache, storage, clock)
}

// == Strategies ==
/// Generates valid cache keys (never the reserved version key)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}".prop_filter("reserved key", |k| k != "version")
}

/// Generates cache values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,128}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Property 1: Round-trip
    // Immediately after a set, get returns the stored value, whatever the expiry.
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl_ms in prop::option::of(1u64..1_000_000)
    ) {
        let (cache, _, _) = test_cache();

        let expiry = ttl_ms.map(Expiry::millis).unwrap_or(Expiry::Never);
        cache.set(&key, &value, expiry);

        let retrieved: Option<String> = cache.get(&key);
        prop_assert_eq!(retrieved, Some(value), "Round-trip value mismatch");
    }

    // Property 2: Statistics Accuracy
    // Hits and misses match what a model map predicts for any operation sequence.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let (cache, _, _) = test_cache();
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(&key, &value, Expiry::Never);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got: Option<String> = cache.get(&key);
                    prop_assert_eq!(got.as_ref(), model.get(&key));
                    match got {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Remove { key } => {
                    cache.remove(&key);
                    model.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, model.len(), "Total entries mismatch");
    }

    // Property 3: TTL Expiration
    // An entry is readable up to its expiry instant and gone, physically, one
    // millisecond later.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl_ms in 1u64..10_000_000
    ) {
        let (cache, storage, clock) = test_cache();

        cache.set(&key, &value, Expiry::millis(ttl_ms));

        clock.advance(Duration::from_millis(ttl_ms));
        prop_assert_eq!(cache.get::<String>(&key), Some(value));

        clock.advance(Duration::from_millis(1));
        prop_assert_eq!(cache.get::<String>(&key), None);
        prop_assert!(!cache.has(&key));
        prop_assert!(storage.get_item(&cache.prefixed_key(&key)).is_none());
    }

    // Property 4: Never-Expiring Entries
    #[test]
    fn prop_never_expiring_entries(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        elapsed_ms in 0u64..u32::MAX as u64
    ) {
        let (cache, _, clock) = test_cache();

        cache.set(&key, &value, Expiry::Never);
        clock.advance(Duration::from_millis(elapsed_ms));
        cache.init();

        prop_assert_eq!(cache.get::<String>(&key), Some(value));
    }

    // Property 5: Malformed Entries
    // Anything that is not an entry envelope reads as a miss and is removed.
    #[test]
    fn prop_malformed_entries_removed(
        key in valid_key_strategy(),
        raw in "[a-z0-9{}\\[\\]:,\" ]{0,40}"
    ) {
        prop_assume!(codec::decode_envelope(&raw).is_err());
        let (cache, storage, _) = test_cache();
        cache.init();

        storage.set_item(&cache.prefixed_key(&key), &raw).unwrap();

        prop_assert_eq!(cache.get_or(&key, -1i64), -1);
        prop_assert!(storage.get_item(&cache.prefixed_key(&key)).is_none());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Property 6: Eviction Exactness
    // With N entries written at distinct instants in any order, a refused write
    // removes exactly ceil(N / 5) entries, the earliest-written ones, and the
    // write then succeeds.
    #[test]
    fn prop_eviction_removes_oldest_fifth(
        order in (1usize..40).prop_flat_map(|n| Just((0..n as u64).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let (cache, storage, clock) = test_cache();
        let n = order.len();

        // Entry i is written at START + 10 * order[i]
        for (i, slot) in order.iter().enumerate() {
            clock.set(START_MS + 10 * slot);
            cache.set(&format!("k{:03}", i), &format!("{:04}", i), Expiry::Never);
        }
        storage.set_quota(Some(storage.used_bytes()));

        clock.set(START_MS + 100_000);
        cache.set("k999", "9999", Expiry::Never);

        let expected_evicted = n.div_ceil(5);
        prop_assert_eq!(cache.stats().evictions, expected_evicted as u64);
        prop_assert!(cache.has("k999"), "Triggering write should succeed");

        for (i, slot) in order.iter().enumerate() {
            let should_be_gone = (*slot as usize) < expected_evicted;
            prop_assert_eq!(
                cache.has(&format!("k{:03}", i)),
                !should_be_gone,
                "Entry k{:03} written in slot {}",
                i,
                slot
            );
        }
        prop_assert_eq!(cache.len(), n - expected_evicted + 1);
    }

    // Property 7: Version Reset
    // Entries written under one version never survive an init under another,
    // and the cache keeps working afterwards.
    #[test]
    fn prop_version_reset_clears_entries(
        entries in prop::collection::vec((valid_key_strategy(), valid_value_strategy()), 1..20),
        old_version in "[0-9]\\.[0-9]\\.[0-9]",
        new_version in "[0-9]\\.[0-9]\\.[0-9]"
    ) {
        prop_assume!(old_version != new_version);
        let storage = Arc::new(MemoryStorage::new());

        let old = CacheManager::new(storage.clone(), CacheConfig::new("app_cache_", old_version));
        for (key, value) in &entries {
            old.set(key, value, Expiry::Never);
        }

        let new = CacheManager::new(storage.clone(), CacheConfig::new("app_cache_", new_version.clone()));
        let report = new.init();
        prop_assert!(report.version_reset);

        for (key, _) in &entries {
            prop_assert!(!new.has(key));
        }
        prop_assert_eq!(storage.get_item("app_cache_version"), Some(new_version));

        new.set("after", "reset", Expiry::Never);
        prop_assert_eq!(new.get::<String>("after"), Some("reset".to_string()));
    }
}

// == Property Test for Error Response Format ==
// This tests the ApiError -> HTTP response conversion

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Property 8: Error Response Format
    // Every error response carries a JSON body with a string "error" field.
    #[test]
    fn prop_error_response_format(
        error_msg in "[a-zA-Z0-9 _-]{1,100}"
    ) {
        use crate::error::ApiError;
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            ApiError::NotFound(error_msg.clone()),
            ApiError::InvalidRequest(error_msg.clone()),
            ApiError::Internal(error_msg.clone()),
        ];

        for error in error_variants {
            let expected_msg = error.to_string();
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let body = response.into_body();
            let bytes = tokio_test::block_on(async {
                to_bytes(body, usize::MAX).await.unwrap()
            });

            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            let error_str = json.get("error").and_then(|v| v.as_str());
            prop_assert_eq!(error_str, Some(expected_msg.as_str()));
        }
    }
}

// == Concurrent Access ==
// Readers racing writers on one key only ever observe complete values.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Property 9: Concurrent Operation Correctness
    #[test]
    fn prop_concurrent_operation_correctness(
        values in prop::collection::vec(valid_value_strategy(), 2..10)
    ) {
        let (cache, _, _) = test_cache();
        cache.set("shared", &values[0], Expiry::Never);

        let observed: Vec<Option<String>> = std::thread::scope(|scope| {
            for value in &values {
                let cache = &cache;
                scope.spawn(move || cache.set("shared", value, Expiry::Never));
            }
            let readers: Vec<_> = (0..values.len())
                .map(|_| {
                    let cache = &cache;
                    scope.spawn(move || cache.get::<String>("shared"))
                })
                .collect();
            readers.into_iter().map(|r| r.join().unwrap()).collect()
        });

        for value in observed {
            let value = value.expect("shared key is never removed");
            prop_assert!(values.contains(&value), "Read a value that was never written");
        }
    }
}
