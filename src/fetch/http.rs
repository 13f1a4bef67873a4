//! Upstream HTTP fetcher backed by reqwest.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName};
use tracing::debug;

use crate::cache::CachedResponse;
use crate::error::{Result, SwError};
use crate::fetch::{FetchRequest, Fetcher};

// == Http Fetcher ==
/// Fetches requests from the upstream origin.
///
/// URLs of the site origin are rewritten onto the upstream base URL; any other
/// origin (cross-origin assets) is fetched as-is.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    site_origin: String,
    upstream_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh reqwest client.
    pub fn new(site_origin: impl Into<String>, upstream_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), site_origin, upstream_url)
    }

    /// Creates a fetcher around an existing client.
    pub fn with_client(
        client: reqwest::Client,
        site_origin: impl Into<String>,
        upstream_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            site_origin: site_origin.into().trim_end_matches('/').to_string(),
            upstream_url: upstream_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Maps a site URL onto the upstream; other URLs pass unchanged.
    pub fn upstream_target(&self, url: &str) -> String {
        match url.strip_prefix(&self.site_origin) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '?']) => {
                format!("{}{}", self.upstream_url, rest)
            }
            _ => url.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        let target = self.upstream_target(&request.url);
        debug!("Fetching {} {}", request.method, target);

        let response = self
            .client
            .request(request.method.clone(), &target)
            .headers(strip_hop_by_hop(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| SwError::Network(format!("{}: {}", target, e)))?;

        let status = response.status();
        let headers = strip_hop_by_hop(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| SwError::Upstream(format!("{}: {}", target, e)))?;

        Ok(CachedResponse::new(status, headers, body))
    }
}

/// Drops headers that describe a single connection and must not be forwarded.
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let hop_by_hop: [HeaderName; 7] = [
        header::CONNECTION,
        header::HOST,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ];

    let mut headers = headers.clone();
    for name in hop_by_hop.iter() {
        headers.remove(name);
    }
    headers
}
