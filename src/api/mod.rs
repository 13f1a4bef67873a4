//! API Module
//!
//! HTTP handlers and routing for the caching proxy.
//!
//! # Endpoints
//! - `POST /__sw/message` - Control message to the worker
//! - `GET /__sw/status` - Cache status and statistics
//! - `POST /__sw/preload` - Warm a namespace with a list of URLs
//! - `GET /__sw/caches/:name` - Entry count and size of one namespace
//! - `DELETE /__sw/caches/:name` - Delete a cache namespace
//! - `GET /__sw/health` - Health check endpoint
//! - fallback - Proxied through the worker

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
