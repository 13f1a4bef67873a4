//! Fetch Module
//!
//! The "network" side of the proxy: anything that can turn a request into a
//! response. Strategies only see the [`Fetcher`] trait, so tests can inject
//! an offline or slow network.

mod http;
mod inflight;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method},
};

use crate::cache::{CachedResponse, RequestKey};
use crate::error::Result;

pub use http::HttpFetcher;
pub use inflight::InFlightFetcher;

// == Fetch Request ==
/// An intercepted request as seen by the network layer.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    /// Request headers to forward
    pub headers: HeaderMap,
    /// Request body (empty for GET)
    pub body: Bytes,
}

impl FetchRequest {
    /// Creates a GET request with no headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Key under which this request is cached.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }
}

// == Fetcher Trait ==
/// Performs a network fetch.
///
/// An `Ok` result is any response the network produced, including non-2xx
/// statuses. `Err` means the network could not be reached at all.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse>;
}
