//! Strategy Module
//!
//! The three policies for resolving a request from cache and network, and the
//! routing table that picks one per URL.
//!
//! # Strategies
//! - Cache-first: static namespace, refreshed in the background on hit
//! - Network-first: network, falling back to the dynamic namespace
//! - Stale-while-revalidate: cached copy now, network copy for next time

mod cache_first;
mod network_first;
pub mod router;
mod stale_while_revalidate;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStorage, CachedResponse};
use crate::error::Result;
use crate::fetch::{FetchRequest, Fetcher};

pub use cache_first::cache_first;
pub use network_first::network_first;
pub use router::RoutingTable;
pub use stale_while_revalidate::stale_while_revalidate;

// == Strategy ==
/// Identifies a caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        };
        f.write_str(name)
    }
}

// == Strategy Context ==
/// Everything a strategy needs: the storage, the network, and the namespace names.
///
/// Cheap to clone so background refreshes can own a copy.
#[derive(Clone)]
pub struct StrategyContext {
    pub storage: CacheStorage,
    pub fetcher: Arc<dyn Fetcher>,
    /// Long-lived namespace (cache-first, stale-while-revalidate)
    pub static_cache: String,
    /// Short-lived namespace (network-first)
    pub dynamic_cache: String,
}

impl StrategyContext {
    pub fn new(
        storage: CacheStorage,
        fetcher: Arc<dyn Fetcher>,
        static_cache: impl Into<String>,
        dynamic_cache: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            static_cache: static_cache.into(),
            dynamic_cache: dynamic_cache.into(),
        }
    }
}

// == Dispatch ==
/// Runs the given strategy for a request.
pub async fn dispatch(
    ctx: &StrategyContext,
    strategy: Strategy,
    request: &FetchRequest,
) -> Result<CachedResponse> {
    match strategy {
        Strategy::CacheFirst => cache_first(ctx, request).await,
        Strategy::NetworkFirst => network_first(ctx, request).await,
        Strategy::StaleWhileRevalidate => stale_while_revalidate(ctx, request).await,
    }
}

/// Network doubles shared by the strategy tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::{HeaderMap, StatusCode};

    use super::StrategyContext;
    use crate::cache::{CacheStorage, CachedResponse};
    use crate::error::{Result, SwError};
    use crate::fetch::{FetchRequest, Fetcher};

    pub const STATIC: &str = "static-v1";
    pub const DYNAMIC: &str = "dynamic-v1";

    /// Scripted network: fixed responses per URL, optional latency, can go offline.
    #[derive(Default)]
    pub struct MockNetwork {
        pub routes: Mutex<HashMap<String, (StatusCode, String)>>,
        pub latency: Mutex<Duration>,
        pub offline: AtomicBool,
        pub calls: AtomicUsize,
    }

    impl MockNetwork {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn respond(&self, url: &str, status: StatusCode, body: &str) {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), (status, body.to_string()));
        }

        pub fn set_latency(&self, latency: Duration) {
            *self.latency.lock().unwrap() = latency;
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for MockNetwork {
        async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let latency = *self.latency.lock().unwrap();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if self.offline.load(Ordering::SeqCst) {
                return Err(SwError::Network(format!("offline: {}", request.url)));
            }
            let (status, body) = self
                .routes
                .lock()
                .unwrap()
                .get(&request.url)
                .cloned()
                .unwrap_or((StatusCode::NOT_FOUND, "missing".to_string()));
            Ok(CachedResponse::new(status, HeaderMap::new(), body))
        }
    }

    pub fn context(network: &Arc<MockNetwork>) -> StrategyContext {
        StrategyContext::new(CacheStorage::new(), network.clone(), STATIC, DYNAMIC)
    }

    pub fn ok(body: &'static str) -> CachedResponse {
        CachedResponse::new(StatusCode::OK, HeaderMap::new(), body)
    }

    /// Polls until `check` is true or the deadline passes.
    pub async fn eventually<F, Fut>(mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_strategy_display_and_serialize() {
        assert_eq!(Strategy::CacheFirst.to_string(), "cache-first");
        assert_eq!(Strategy::StaleWhileRevalidate.to_string(), "stale-while-revalidate");
        assert_eq!(
            serde_json::to_string(&Strategy::NetworkFirst).unwrap(),
            "\"network-first\""
        );
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_namespace() {
        let network = MockNetwork::new();
        network.respond("http://site/app.js", StatusCode::OK, "js");
        network.respond("http://site/api/x", StatusCode::OK, "{}");
        let ctx = context(&network);

        dispatch(&ctx, Strategy::CacheFirst, &FetchRequest::get("http://site/app.js"))
            .await
            .unwrap();
        dispatch(&ctx, Strategy::NetworkFirst, &FetchRequest::get("http://site/api/x"))
            .await
            .unwrap();

        assert_eq!(ctx.storage.keys(STATIC).await.len(), 1);
        assert_eq!(ctx.storage.keys(DYNAMIC).await.len(), 1);
    }
}
