//! Cache Storage Module
//!
//! Named namespaces of request → response pairs shared by every strategy.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::cache::{CacheStats, CachedResponse, RequestKey};

// == Namespace ==
/// A named partition of stored responses.
#[derive(Debug)]
struct Namespace {
    name: String,
    entries: HashMap<RequestKey, CachedResponse>,
}

impl Namespace {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    fn size_bytes(&self) -> usize {
        self.entries.values().map(CachedResponse::size_bytes).sum()
    }

    fn status(&self) -> NamespaceStatus {
        NamespaceStatus {
            name: self.name.clone(),
            entries: self.entries.len(),
            size_bytes: self.size_bytes(),
        }
    }
}

#[derive(Debug, Default)]
struct StorageInner {
    /// Namespaces in creation order; cross-namespace lookups follow it
    namespaces: Vec<Namespace>,
    stats: CacheStats,
}

impl StorageInner {
    fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    fn namespace_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.namespaces.iter_mut().find(|ns| ns.name == name)
    }

    fn open(&mut self, name: &str) -> &mut Namespace {
        let idx = match self.namespaces.iter().position(|ns| ns.name == name) {
            Some(idx) => idx,
            None => {
                debug!("Creating cache namespace {}", name);
                self.namespaces.push(Namespace::new(name));
                self.namespaces.len() - 1
            }
        };
        &mut self.namespaces[idx]
    }

    fn total_entries(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.entries.len()).sum()
    }

    fn refresh_total(&mut self) {
        let total = self.total_entries();
        self.stats.set_total_entries(total);
    }
}

// == Storage Status ==
/// Entry count and body size of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceStatus {
    pub name: String,
    pub entries: usize,
    pub size_bytes: usize,
}

/// Snapshot of what the storage currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStatus {
    /// Namespace names in creation order
    pub namespaces: Vec<String>,
    /// Entry count across all namespaces
    pub entries: usize,
    /// Sum of stored body sizes in bytes
    pub size_bytes: usize,
    /// Per-namespace breakdown, in creation order
    pub caches: Vec<NamespaceStatus>,
}

// == Cache Storage ==
/// Shared handle to the cache storage.
///
/// Cloning the handle shares the same underlying namespaces. All writes are
/// last-writer-wins; there is no isolation between concurrent operations.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    inner: Arc<RwLock<StorageInner>>,
}

impl CacheStorage {
    // == Constructor ==
    /// Creates an empty storage with no namespaces.
    pub fn new() -> Self {
        Self::default()
    }

    // == Open ==
    /// Creates the namespace if it does not exist yet.
    pub async fn open(&self, name: &str) {
        let mut inner = self.inner.write().await;
        inner.open(name);
    }

    /// Returns true if a namespace with this name exists.
    #[cfg(test)]
    pub(crate) async fn has(&self, name: &str) -> bool {
        self.inner.read().await.namespace(name).is_some()
    }

    // == Names ==
    /// Returns all namespace names in creation order.
    pub async fn names(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.namespaces.iter().map(|ns| ns.name.clone()).collect()
    }

    // == Delete Namespace ==
    /// Drops a namespace and every entry in it.
    ///
    /// Returns false if the namespace did not exist.
    pub async fn delete_namespace(&self, name: &str) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.namespaces.len();
        inner.namespaces.retain(|ns| ns.name != name);
        let removed = inner.namespaces.len() != before;
        inner.refresh_total();
        removed
    }

    // == Match In ==
    /// Looks up a request in a single namespace.
    pub async fn match_in(&self, name: &str, key: &RequestKey) -> Option<CachedResponse> {
        let mut inner = self.inner.write().await;
        let found = inner
            .namespace(name)
            .and_then(|ns| ns.entries.get(key))
            .cloned();
        record_lookup(&mut inner.stats, found.is_some());
        trace!("match {} in {}: {}", key, name, found.is_some());
        found
    }

    // == Match Any ==
    /// Looks up a request across all namespaces, oldest namespace first.
    pub async fn match_any(&self, key: &RequestKey) -> Option<CachedResponse> {
        let mut inner = self.inner.write().await;
        let found = inner
            .namespaces
            .iter()
            .find_map(|ns| ns.entries.get(key))
            .cloned();
        record_lookup(&mut inner.stats, found.is_some());
        found
    }

    // == Put ==
    /// Stores a response under a request key, creating the namespace if needed.
    ///
    /// Non-2xx responses are never stored; returns whether the write happened.
    pub async fn put(&self, name: &str, key: RequestKey, response: CachedResponse) -> bool {
        if !response.is_success() {
            debug!("Not caching {} with status {}", key, response.status);
            return false;
        }

        let mut inner = self.inner.write().await;
        trace!("put {} into {}", key, name);
        inner.open(name).entries.insert(key, response);
        inner.stats.record_write();
        inner.refresh_total();
        true
    }

    // == Delete ==
    /// Removes a single entry. Returns false if it was not present.
    #[cfg(test)]
    pub(crate) async fn delete(&self, name: &str, key: &RequestKey) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner
            .namespace_mut(name)
            .map(|ns| ns.entries.remove(key).is_some())
            .unwrap_or(false);
        inner.refresh_total();
        removed
    }

    // == Keys ==
    /// Returns the keys stored in a namespace (empty if it does not exist).
    #[cfg(test)]
    pub(crate) async fn keys(&self, name: &str) -> Vec<RequestKey> {
        let inner = self.inner.read().await;
        inner
            .namespace(name)
            .map(|ns| ns.entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    // == Evict Where ==
    /// Removes every entry of a namespace for which `should_evict` is true.
    ///
    /// Returns the number of evicted entries and counts them in the stats.
    pub async fn evict_where<F>(&self, name: &str, mut should_evict: F) -> usize
    where
        F: FnMut(&RequestKey, &CachedResponse) -> bool,
    {
        let mut inner = self.inner.write().await;
        let evicted = match inner.namespace_mut(name) {
            Some(ns) => {
                let before = ns.entries.len();
                ns.entries.retain(|key, entry| !should_evict(key, entry));
                before - ns.entries.len()
            }
            None => 0,
        };
        inner.stats.record_evictions(evicted as u64);
        inner.refresh_total();
        evicted
    }

    // == Len ==
    /// Returns the number of entries across all namespaces.
    pub async fn len(&self) -> usize {
        self.inner.read().await.total_entries()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.total_entries());
        stats
    }

    // == Status ==
    /// Returns entry counts and body sizes, in total and per namespace.
    pub async fn status(&self) -> StorageStatus {
        let inner = self.inner.read().await;
        let caches: Vec<NamespaceStatus> = inner.namespaces.iter().map(Namespace::status).collect();
        StorageStatus {
            namespaces: caches.iter().map(|ns| ns.name.clone()).collect(),
            entries: caches.iter().map(|ns| ns.entries).sum(),
            size_bytes: caches.iter().map(|ns| ns.size_bytes).sum(),
            caches,
        }
    }

    /// Returns the status of a single namespace, if it exists.
    pub async fn namespace_status(&self, name: &str) -> Option<NamespaceStatus> {
        self.inner.read().await.namespace(name).map(Namespace::status)
    }
}

fn record_lookup(stats: &mut CacheStats, hit: bool) {
    if hit {
        stats.record_hit();
    } else {
        stats.record_miss();
    }
}
