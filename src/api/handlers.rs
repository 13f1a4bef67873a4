//! API Handlers
//!
//! HTTP request handlers for the proxy and its management endpoints.

use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, SwError};
use crate::fetch::FetchRequest;
use crate::cache::NamespaceStatus;
use crate::models::{
    ControlMessage, DeleteCacheResponse, HealthResponse, PreloadRequest, StatusResponse,
};
use crate::worker::{PreloadReport, ServiceWorker, PRELOAD_CACHE};

/// Largest request body forwarded to the upstream.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache manager serving every proxied request
    pub worker: Arc<ServiceWorker>,
}

impl AppState {
    /// Creates a new AppState around an existing worker.
    pub fn new(worker: ServiceWorker) -> Self {
        Self {
            worker: Arc::new(worker),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The worker fetches from the configured upstream and starts in the
    /// `Parsed` state; call install/activate before serving.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ServiceWorker::from_config(config))
    }
}

/// Fallback handler: every request not addressed to `/__sw/*`
///
/// Intercepted requests are answered by the worker; the rest are forwarded
/// to the network unchanged.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let url = if parts.uri.scheme().is_some() && parts.uri.authority().is_some() {
        // Absolute-form request target (forward-proxy style)
        parts.uri.to_string()
    } else {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        state.worker.absolute_url(path)
    };

    let body = match to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return SwError::InvalidRequest(format!("Unreadable request body: {}", e))
                .into_response()
        }
    };

    let fetch = FetchRequest {
        method: parts.method,
        url,
        headers: parts.headers,
        body,
    };

    match state.worker.respond(&fetch).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Handler for POST /__sw/message
///
/// Accepts a control message. `CLEAN_CACHE` starts the janitor in the
/// background; the caller gets no report.
pub async fn message_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ControlMessage>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(message) =
        payload.map_err(|e| SwError::InvalidRequest(format!("Unknown control message: {}", e)))?;

    match message {
        ControlMessage::CleanCache => {
            info!("Received clean-cache signal");
            let worker = state.worker.clone();
            tokio::spawn(async move {
                let report = worker.clean_cache().await;
                debug!("Clean-cache signal done: {:?}", report);
            });
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// Handler for GET /__sw/status
///
/// Returns lifecycle state, cache contents and statistics.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.worker.status().await.into())
}

/// Handler for POST /__sw/preload
///
/// Warms a namespace with a list of URLs and reports what was stored.
pub async fn preload_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PreloadRequest>, JsonRejection>,
) -> Result<Json<PreloadReport>> {
    let Json(request) =
        payload.map_err(|e| SwError::InvalidRequest(format!("Invalid preload request: {}", e)))?;
    let cache = request.cache.as_deref().unwrap_or(PRELOAD_CACHE);

    let report = state.worker.preload(cache, &request.urls).await?;
    Ok(Json(report))
}

/// Handler for GET /__sw/caches/:name
pub async fn cache_status_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<NamespaceStatus>> {
    Ok(Json(state.worker.cache_status(&name).await?))
}

/// Handler for DELETE /__sw/caches/:name
///
/// Drops one cache namespace.
pub async fn delete_cache_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteCacheResponse>> {
    state.worker.delete_cache(&name).await?;
    Ok(Json(DeleteCacheResponse::new(name)))
}

/// Handler for GET /__sw/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStorage, RequestKey};
    use crate::strategy::testing::{ok, MockNetwork};

    fn state() -> AppState {
        let config = Config {
            site_origin: "http://site".to_string(),
            ..Config::default()
        };
        AppState::new(ServiceWorker::new(&config, CacheStorage::new(), MockNetwork::new()))
    }

    #[tokio::test]
    async fn test_message_handler_accepts_clean_cache() {
        let state = state();
        let result = message_handler(State(state), Ok(Json(ControlMessage::CleanCache))).await;
        assert_eq!(result.unwrap(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_status_handler() {
        let state = state();
        state
            .worker
            .storage()
            .put("static-v1", RequestKey::get("http://site/a.js"), ok("abc"))
            .await;

        let response = status_handler(State(state)).await;
        assert_eq!(response.entries, 1);
        assert_eq!(response.size_bytes, 3);
    }

    #[tokio::test]
    async fn test_delete_cache_handler() {
        let state = state();
        state.worker.storage().open("dynamic-v1").await;

        let result = delete_cache_handler(State(state.clone()), Path("dynamic-v1".to_string())).await;
        assert_eq!(result.unwrap().name, "dynamic-v1");

        let result = delete_cache_handler(State(state), Path("dynamic-v1".to_string())).await;
        assert!(matches!(result, Err(SwError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_preload_handler_defaults_cache() {
        let network = MockNetwork::new();
        network.respond("http://site/logo.svg", StatusCode::OK, "<svg/>");
        let config = Config {
            site_origin: "http://site".to_string(),
            ..Config::default()
        };
        let state = AppState::new(ServiceWorker::new(&config, CacheStorage::new(), network));

        let request = PreloadRequest {
            cache: None,
            urls: vec!["/logo.svg".to_string()],
        };
        let report = preload_handler(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap();
        assert_eq!(report.cache, PRELOAD_CACHE);
        assert_eq!(report.stored, 1);

        let size = cache_status_handler(State(state), Path(PRELOAD_CACHE.to_string()))
            .await
            .unwrap();
        assert_eq!(size.size_bytes, "<svg/>".len());
    }

    #[tokio::test]
    async fn test_cache_status_handler_unknown_cache() {
        let result = cache_status_handler(State(state()), Path("nope".to_string())).await;
        assert!(matches!(result, Err(SwError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
