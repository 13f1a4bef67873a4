//! API Routes
//!
//! Configures the Axum router: management endpoints under `/__sw` and the
//! caching proxy for everything else.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_status_handler, delete_cache_handler, health_handler, message_handler,
    preload_handler, proxy_handler, status_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /__sw/message` - Control message (`{"type":"CLEAN_CACHE"}`)
/// - `GET /__sw/status` - Cache status and statistics
/// - `POST /__sw/preload` - Warm a namespace with a list of URLs
/// - `GET /__sw/caches/:name` - Entry count and size of one namespace
/// - `DELETE /__sw/caches/:name` - Delete a cache namespace
/// - `GET /__sw/health` - Health check endpoint
/// - anything else - Served by the worker or passed through to the upstream
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__sw/message", post(message_handler))
        .route("/__sw/status", get(status_handler))
        .route("/__sw/preload", post(preload_handler))
        .route(
            "/__sw/caches/:name",
            get(cache_status_handler).delete(delete_cache_handler),
        )
        .route("/__sw/health", get(health_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
