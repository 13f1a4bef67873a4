//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check storage and janitor invariants over generated inputs.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use chrono::{DateTime, Timelike, Utc};
use proptest::prelude::*;
use tokio_test::block_on;

use crate::cache::{CacheStorage, CachedResponse, RequestKey};
use crate::strategy::{RoutingTable, Strategy as CacheStrategy};
use crate::worker::Janitor;

// == Test Configuration ==
const NAMESPACE: &str = "static-v1";
const RETENTION_DAYS: i64 = 7;

// == Strategies ==
/// Generates site paths
fn path_strategy() -> impl Strategy<Value = String> {
    "/[a-z0-9/]{0,24}".prop_map(|s| s)
}

/// Generates response bodies
fn body_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

/// Generates any HTTP status code
fn status_strategy() -> impl Strategy<Value = StatusCode> {
    (100u16..600).prop_map(|code| StatusCode::from_u16(code).unwrap())
}

/// An entry age in hours, or None for an undated entry
fn age_strategy() -> impl Strategy<Value = Option<i64>> {
    prop::option::of(0i64..(24 * 30))
}

fn response(status: StatusCode, body: String, date: Option<DateTime<Utc>>) -> CachedResponse {
    let mut headers = HeaderMap::new();
    if let Some(date) = date {
        let value = date.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        headers.insert(header::DATE, HeaderValue::from_str(&value).unwrap());
    }
    CachedResponse::new(status, headers, body)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Only 2xx responses ever land in a namespace.
    #[test]
    fn prop_only_success_is_stored(
        path in path_strategy(),
        status in status_strategy(),
        body in body_strategy()
    ) {
        let storage = CacheStorage::new();
        let key = RequestKey::get(format!("http://site{}", path));

        let stored = block_on(storage.put(NAMESPACE, key.clone(), response(status, body, None)));
        let found = block_on(storage.match_in(NAMESPACE, &key));

        prop_assert_eq!(stored, status.is_success());
        prop_assert_eq!(found.is_some(), status.is_success());
    }

    // The last successful write for a key is what a lookup returns.
    #[test]
    fn prop_last_writer_wins(
        path in path_strategy(),
        bodies in prop::collection::vec(body_strategy(), 1..10)
    ) {
        let storage = CacheStorage::new();
        let key = RequestKey::get(format!("http://site{}", path));

        for body in &bodies {
            block_on(storage.put(NAMESPACE, key.clone(), response(StatusCode::OK, body.clone(), None)));
        }

        let found = block_on(storage.match_in(NAMESPACE, &key)).unwrap();
        prop_assert_eq!(&found.body[..], bodies.last().unwrap().as_bytes());
        prop_assert_eq!(block_on(storage.len()), 1);
    }

    // After a sweep, exactly the dated entries older than the window are gone.
    #[test]
    fn prop_janitor_respects_retention(ages in prop::collection::vec(age_strategy(), 1..30)) {
        let storage = CacheStorage::new();
        // Half a second past the whole second the headers are truncated to
        let now = Utc::now().with_nanosecond(500_000_000).unwrap();

        for (i, age) in ages.iter().enumerate() {
            let date = age.map(|hours| now - chrono::Duration::hours(hours));
            let key = RequestKey::get(format!("http://site/entry/{}", i));
            block_on(storage.put(NAMESPACE, key, response(StatusCode::OK, String::new(), date)));
        }

        let janitor = Janitor::new(Duration::from_secs(RETENTION_DAYS as u64 * 86_400), false);
        let report = block_on(janitor.sweep_at(&storage, now));

        let mut expected_kept = 0;
        for (i, age) in ages.iter().enumerate() {
            let key = RequestKey::get(format!("http://site/entry/{}", i));
            let present = block_on(storage.match_in(NAMESPACE, &key)).is_some();
            // Header truncation makes every dated entry half a second older,
            // so one aged exactly the window is past it.
            let should_keep = match age {
                Some(hours) => *hours < RETENTION_DAYS * 24,
                None => true,
            };
            prop_assert_eq!(present, should_keep, "entry {} aged {:?}", i, age);
            if should_keep {
                expected_kept += 1;
            }
        }

        prop_assert_eq!(report.scanned, ages.len());
        prop_assert_eq!(report.evicted, ages.len() - expected_kept);
        prop_assert_eq!(report.skipped_undated, ages.iter().filter(|a| a.is_none()).count());
    }

    // Classification is total and deterministic, and image extensions outside
    // asset directories always revalidate.
    #[test]
    fn prop_image_extensions_revalidate(
        stem in "[a-z]{1,12}",
        ext in prop::sample::select(vec!["png", "jpg", "jpeg", "svg", "gif", "webp", "avif"])
    ) {
        let table = RoutingTable::standard();
        let url = format!("http://site/gallery/{}.{}", stem, ext);
        prop_assert_eq!(table.classify(&url), CacheStrategy::StaleWhileRevalidate);
        prop_assert_eq!(table.classify(&url), table.classify(&url));
    }

    // Anything under /api/ outside asset directories is network-first.
    #[test]
    fn prop_api_paths_are_network_first(rest in "[a-z0-9/]{0,20}") {
        let table = RoutingTable::standard();
        let url = format!("http://site/api/{}", rest);
        prop_assume!(!url.contains("/assets/") && !url.contains("/images/"));
        prop_assert_eq!(table.classify(&url), CacheStrategy::NetworkFirst);
    }
}
