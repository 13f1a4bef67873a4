//! Response DTOs for the management API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::NamespaceStatus;
use crate::worker::{Lifecycle, WorkerStatus};

/// Response body for the status endpoint (GET /__sw/status)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Worker lifecycle state
    pub state: Lifecycle,
    /// Namespace names in creation order
    pub namespaces: Vec<String>,
    /// Entries across all namespaces
    pub entries: usize,
    /// Total stored body size in bytes
    pub size_bytes: usize,
    /// Entry count and size of each namespace
    pub caches: Vec<NamespaceStatus>,
    /// Number of cache lookups that found an entry
    pub hits: u64,
    /// Number of cache lookups that found nothing
    pub misses: u64,
    /// Number of cache writes
    pub writes: u64,
    /// Number of entries removed by the janitor
    pub evictions: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Fetches currently in flight
    pub inflight: usize,
    /// Requests that joined an in-flight fetch
    pub collapsed: u64,
}

impl From<WorkerStatus> for StatusResponse {
    fn from(status: WorkerStatus) -> Self {
        Self {
            state: status.state,
            namespaces: status.storage.namespaces,
            entries: status.storage.entries,
            size_bytes: status.storage.size_bytes,
            caches: status.storage.caches,
            hits: status.stats.hits,
            misses: status.stats.misses,
            writes: status.stats.writes,
            evictions: status.stats.evictions,
            hit_rate: status.stats.hit_rate(),
            inflight: status.inflight,
            collapsed: status.collapsed,
        }
    }
}

/// Response body for DELETE /__sw/caches/:name
#[derive(Debug, Clone, Serialize)]
pub struct DeleteCacheResponse {
    /// Success message
    pub message: String,
    /// The namespace that was deleted
    pub name: String,
}

impl DeleteCacheResponse {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            message: format!("Cache '{}' cleared", name),
            name,
        }
    }
}

/// Response body for the health endpoint (GET /__sw/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
