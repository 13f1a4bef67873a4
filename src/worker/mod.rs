//! Worker Module
//!
//! The request-interception cache manager: lifecycle, routing of intercepted
//! requests to a strategy, the last-resort fallback, and the janitor.

mod janitor;
mod lifecycle;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::Method;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, CacheStorage, CachedResponse, NamespaceStatus, StorageStatus};
use crate::config::{origin_of, Config};
use crate::error::{Result, SwError};
use crate::fetch::{FetchRequest, Fetcher, HttpFetcher, InFlightFetcher};
use crate::strategy::{dispatch, RoutingTable, Strategy, StrategyContext};

pub use janitor::{Janitor, JanitorReport};
pub use lifecycle::Lifecycle;

/// Namespace warmed by a preload request that names none.
pub const PRELOAD_CACHE: &str = "critical-resources";

// == Service Worker ==
/// Intercepts site requests and answers them from cache and network.
pub struct ServiceWorker {
    ctx: StrategyContext,
    /// Network without request collapsing, for pass-through and install
    network: Arc<dyn Fetcher>,
    inflight: Arc<InFlightFetcher>,
    routes: RoutingTable,
    janitor: Janitor,
    site_origin: String,
    precache_paths: Vec<String>,
    slow_request: Duration,
    state: RwLock<Lifecycle>,
}

impl ServiceWorker {
    // == Constructor ==
    /// Creates a worker over the given storage and network.
    pub fn new(config: &Config, storage: CacheStorage, network: Arc<dyn Fetcher>) -> Self {
        let inflight = Arc::new(InFlightFetcher::new(Arc::clone(&network)));
        let ctx = StrategyContext::new(
            storage,
            inflight.clone(),
            config.static_cache_name(),
            config.dynamic_cache_name(),
        );

        Self {
            ctx,
            network,
            inflight,
            routes: RoutingTable::standard(),
            janitor: Janitor::new(config.retention(), config.evict_undated),
            site_origin: config.site_origin.trim_end_matches('/').to_string(),
            precache_paths: config.precache_paths.clone(),
            slow_request: Duration::from_millis(config.slow_request_ms),
            state: RwLock::new(Lifecycle::Parsed),
        }
    }

    /// Creates a worker that fetches from the configured upstream.
    pub fn from_config(config: &Config) -> Self {
        let network = Arc::new(HttpFetcher::new(&config.site_origin, &config.upstream_url));
        Self::new(config, CacheStorage::new(), network)
    }

    // == Accessors ==
    pub fn storage(&self) -> &CacheStorage {
        &self.ctx.storage
    }

    pub fn site_origin(&self) -> &str {
        &self.site_origin
    }

    pub fn static_cache(&self) -> &str {
        &self.ctx.static_cache
    }

    pub fn dynamic_cache(&self) -> &str {
        &self.ctx.dynamic_cache
    }

    pub async fn state(&self) -> Lifecycle {
        *self.state.read().await
    }

    async fn set_state(&self, state: Lifecycle) {
        *self.state.write().await = state;
        debug!("Worker state: {}", state);
    }

    /// Resolves a path against the site origin; absolute URLs pass unchanged.
    pub fn absolute_url(&self, path_or_url: &str) -> String {
        if path_or_url.contains("://") {
            path_or_url.to_string()
        } else if path_or_url.starts_with('/') {
            format!("{}{}", self.site_origin, path_or_url)
        } else {
            format!("{}/{}", self.site_origin, path_or_url)
        }
    }

    // == Install ==
    /// Pre-caches the install-time asset list into the static namespace.
    ///
    /// All or nothing: if any asset cannot be fetched with a 2xx status,
    /// nothing is stored and the error is returned. The worker moves on to
    /// `Installed` either way so activation is never blocked.
    pub async fn install(&self) -> Result<usize> {
        self.set_state(Lifecycle::Installing).await;
        info!("Installing: pre-caching {} assets", self.precache_paths.len());

        let result = self.fetch_precache().await;

        match &result {
            Ok(responses) => {
                for (request, response) in responses {
                    self.ctx
                        .storage
                        .put(&self.ctx.static_cache, request.key(), response.clone())
                        .await;
                }
                info!("Installed successfully");
            }
            Err(e) => error!("Installation failed: {}", e),
        }

        self.set_state(Lifecycle::Installed).await;
        result.map(|responses| responses.len())
    }

    async fn fetch_precache(&self) -> Result<Vec<(FetchRequest, CachedResponse)>> {
        let mut fetched = Vec::with_capacity(self.precache_paths.len());

        for path in &self.precache_paths {
            let request = FetchRequest::get(self.absolute_url(path));
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| SwError::Install(format!("{}: {}", path, e)))?;

            if !response.is_success() {
                return Err(SwError::Install(format!(
                    "{}: upstream answered {}",
                    path, response.status
                )));
            }
            fetched.push((request, response));
        }

        Ok(fetched)
    }

    // == Activate ==
    /// Deletes every namespace not belonging to this version, then starts
    /// intercepting. Returns the deleted namespace names.
    pub async fn activate(&self) -> Vec<String> {
        self.set_state(Lifecycle::Activating).await;
        info!("Activating");

        let mut deleted = Vec::new();
        for name in self.ctx.storage.names().await {
            if name != self.ctx.static_cache && name != self.ctx.dynamic_cache {
                info!("Deleting old cache {}", name);
                self.ctx.storage.delete_namespace(&name).await;
                deleted.push(name);
            }
        }

        self.set_state(Lifecycle::Active).await;
        info!("Activated successfully");
        deleted
    }

    // == Should Intercept ==
    /// True if the worker serves this request itself.
    ///
    /// Non-GET requests and cross-origin requests that do not look like static
    /// assets are left to the network.
    pub async fn should_intercept(&self, request: &FetchRequest) -> bool {
        if !self.state().await.is_active() || request.method != Method::GET {
            return false;
        }

        origin_of(&request.url) == self.site_origin || self.routes.is_asset_request(&request.url)
    }

    // == Classify ==
    pub fn classify(&self, request: &FetchRequest) -> Strategy {
        self.routes.classify(&request.url)
    }

    // == Handle ==
    /// Serves an intercepted request; `None` if the request is not intercepted.
    ///
    /// Never fails: if the strategy errors, any cached copy in any namespace is
    /// served, and failing that a synthetic 503 `Offline`.
    pub async fn handle(&self, request: &FetchRequest) -> Option<CachedResponse> {
        if !self.should_intercept(request).await {
            return None;
        }

        let started = Instant::now();
        let strategy = self.classify(request);
        let response = match dispatch(&self.ctx, strategy, request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Request {} failed: {}", request.url, e);
                match self.ctx.storage.match_any(&request.key()).await {
                    Some(cached) => cached,
                    None => CachedResponse::offline(),
                }
            }
        };

        let elapsed = started.elapsed();
        if elapsed > self.slow_request {
            warn!(
                "Slow request: {} took {}ms ({})",
                request.url,
                elapsed.as_millis(),
                strategy
            );
        }

        Some(response)
    }

    // == Respond ==
    /// Serves a request either from the worker or straight from the network.
    pub async fn respond(&self, request: &FetchRequest) -> Result<CachedResponse> {
        match self.handle(request).await {
            Some(response) => Ok(response),
            None => {
                debug!("Passing through {} {}", request.method, request.url);
                self.network.fetch(request).await
            }
        }
    }

    // == Clean Cache ==
    /// Runs the janitor over every namespace.
    pub async fn clean_cache(&self) -> JanitorReport {
        self.janitor.sweep(&self.ctx.storage).await
    }

    // == Delete Cache ==
    /// Drops one namespace by name.
    pub async fn delete_cache(&self, name: &str) -> Result<()> {
        if self.ctx.storage.delete_namespace(name).await {
            info!("Cache {} cleared", name);
            Ok(())
        } else {
            Err(SwError::NotFound(format!("Cache '{}' does not exist", name)))
        }
    }

    // == Preload ==
    /// Fetches a list of URLs into a named namespace ahead of use.
    ///
    /// Each URL is resolved against the site origin and fetched concurrently.
    /// Only 2xx responses are stored; the rest, and network failures, are
    /// reported back without failing the whole batch.
    pub async fn preload(&self, cache: &str, urls: &[String]) -> Result<PreloadReport> {
        if cache.is_empty() {
            return Err(SwError::InvalidRequest("Cache name must not be empty".to_string()));
        }
        if urls.is_empty() {
            return Err(SwError::InvalidRequest("Nothing to preload".to_string()));
        }

        self.ctx.storage.open(cache).await;

        let fetches = urls.iter().map(|url| async move {
            let request = FetchRequest::get(self.absolute_url(url));
            let stored = match self.ctx.fetcher.fetch(&request).await {
                Ok(response) => {
                    let status = response.status;
                    let stored = self.ctx.storage.put(cache, request.key(), response).await;
                    if !stored {
                        debug!("Preload of {} answered {}", request.url, status);
                    }
                    stored
                }
                Err(e) => {
                    debug!("Preload of {} failed: {}", request.url, e);
                    false
                }
            };
            (url, stored)
        });

        let mut report = PreloadReport {
            cache: cache.to_string(),
            requested: urls.len(),
            stored: 0,
            failed: Vec::new(),
        };
        for (url, stored) in join_all(fetches).await {
            if stored {
                report.stored += 1;
            } else {
                report.failed.push(url.clone());
            }
        }

        info!(
            "Preloaded {}/{} resources into {}",
            report.stored, report.requested, cache
        );
        Ok(report)
    }

    // == Cache Status ==
    /// Entry count and size of one namespace.
    pub async fn cache_status(&self, name: &str) -> Result<NamespaceStatus> {
        self.ctx
            .storage
            .namespace_status(name)
            .await
            .ok_or_else(|| SwError::NotFound(format!("Cache '{}' does not exist", name)))
    }

    // == Status ==
    pub async fn status(&self) -> WorkerStatus {
        WorkerStatus {
            state: self.state().await,
            storage: self.ctx.storage.status().await,
            stats: self.ctx.storage.stats().await,
            inflight: self.inflight.active(),
            collapsed: self.inflight.collapsed_count(),
        }
    }
}

// == Preload Report ==
/// Outcome of a preload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// Namespace the resources were stored in
    pub cache: String,
    /// Number of URLs requested
    pub requested: usize,
    /// Number of URLs fetched with a 2xx status and stored
    pub stored: usize,
    /// URLs that could not be fetched or did not answer 2xx
    pub failed: Vec<String>,
}

// == Worker Status ==
/// Snapshot of the worker for the status endpoint.
#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub state: Lifecycle,
    pub storage: StorageStatus,
    pub stats: CacheStats,
    pub inflight: usize,
    pub collapsed: u64,
}
