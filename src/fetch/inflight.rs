//! In-flight request collapsing.
//!
//! Concurrent GET fetches for the same key share one upstream request instead
//! of each hitting the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::http::{header, Method};
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use tracing::trace;

use crate::cache::{CachedResponse, RequestKey};
use crate::error::Result;
use crate::fetch::{FetchRequest, Fetcher};

type SharedFetch = Shared<BoxFuture<'static, Result<CachedResponse>>>;
type PendingMap = Arc<Mutex<HashMap<RequestKey, PendingFetch>>>;

/// A registered fetch. The map only holds a weak handle, so the fetch is
/// dropped as soon as its last waiter goes away.
struct PendingFetch {
    id: u64,
    fetch: WeakShared<BoxFuture<'static, Result<CachedResponse>>>,
}

/// Unregisters a fetch when it settles or is dropped unfinished.
struct PendingGuard {
    map: PendingMap,
    key: RequestKey,
    id: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.get(&self.key).map(|entry| entry.id) == Some(self.id) {
            pending.remove(&self.key);
        }
    }
}

// == In-Flight Fetcher ==
/// Wraps a fetcher so identical concurrent GETs are collapsed into one.
///
/// An entry lives in the pending map only while its fetch is unresolved and
/// someone is still waiting on it; the next request after that goes to the
/// network again. Requests carrying credentials (`Authorization`, `Cookie`)
/// are never collapsed, their responses belong to one client.
pub struct InFlightFetcher {
    inner: Arc<dyn Fetcher>,
    pending: PendingMap,
    next_id: AtomicU64,
    collapsed: AtomicU64,
}

impl InFlightFetcher {
    pub fn new(inner: Arc<dyn Fetcher>) -> Self {
        Self {
            inner,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            collapsed: AtomicU64::new(0),
        }
    }

    /// Number of fetches currently in flight.
    pub fn active(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of requests that joined an existing fetch instead of starting one.
    pub fn collapsed_count(&self) -> u64 {
        self.collapsed.load(Ordering::Relaxed)
    }

    fn join_or_start(&self, request: &FetchRequest) -> SharedFetch {
        let key = request.key();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = pending.get(&key).and_then(|entry| entry.fetch.upgrade()) {
            self.collapsed.fetch_add(1, Ordering::Relaxed);
            trace!("Joining in-flight fetch for {}", key);
            return existing;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = PendingGuard {
            map: Arc::clone(&self.pending),
            key: key.clone(),
            id,
        };
        let inner = Arc::clone(&self.inner);
        let owned = request.clone();

        let fetch = async move {
            let _guard = guard;
            inner.fetch(&owned).await
        }
        .boxed()
        .shared();

        if let Some(weak) = fetch.downgrade() {
            pending.insert(key, PendingFetch { id, fetch: weak });
        }
        fetch
    }
}

/// Responses to credentialed requests are per client and must not be shared.
fn carries_credentials(request: &FetchRequest) -> bool {
    request.headers.contains_key(header::AUTHORIZATION)
        || request.headers.contains_key(header::COOKIE)
}

#[async_trait]
impl Fetcher for InFlightFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        if request.method != Method::GET || carries_credentials(request) {
            return self.inner.fetch(request).await;
        }

        self.join_or_start(request).await
    }
}
