//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::time::Duration;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the origin that plays the role of "the network"
    pub upstream_url: String,
    /// Origin of the site being served; requests to other origins are cross-origin
    pub site_origin: String,
    /// Version suffix of the cache namespaces (`static-v1`, `dynamic-v1`)
    pub cache_version: String,
    /// Paths fetched into the static namespace at install time
    pub precache_paths: Vec<String>,
    /// Janitor retention window in days
    pub retention_days: u64,
    /// Interval in seconds between automatic clean-cache signals, 0 disables
    pub clean_interval: u64,
    /// Requests slower than this many milliseconds are logged
    pub slow_request_ms: u64,
    /// Use the stored-at time for entries without a `date` header
    pub evict_undated: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Upstream origin (default: http://127.0.0.1:8080)
    /// - `SITE_ORIGIN` - Site origin (default: origin of `UPSTREAM_URL`)
    /// - `CACHE_VERSION` - Namespace version suffix (default: v1)
    /// - `PRECACHE_PATHS` - Comma separated install list (default: /,/index.html,/manifest.json)
    /// - `RETENTION_DAYS` - Janitor retention window (default: 7)
    /// - `CLEAN_INTERVAL` - Seconds between clean-cache signals (default: 86400)
    /// - `SLOW_REQUEST_MS` - Slow request threshold (default: 1000)
    /// - `EVICT_UNDATED` - Evict undated entries by stored-at time (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let upstream_url = env::var("UPSTREAM_URL")
            .ok()
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.upstream_url);

        let site_origin = env::var("SITE_ORIGIN")
            .ok()
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| origin_of(&upstream_url));

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            upstream_url,
            site_origin,
            cache_version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_version),
            precache_paths: env::var("PRECACHE_PATHS")
                .ok()
                .map(|v| parse_path_list(&v))
                .unwrap_or(defaults.precache_paths),
            retention_days: parse_var("RETENTION_DAYS").unwrap_or(defaults.retention_days),
            clean_interval: parse_var("CLEAN_INTERVAL").unwrap_or(defaults.clean_interval),
            slow_request_ms: parse_var("SLOW_REQUEST_MS").unwrap_or(defaults.slow_request_ms),
            evict_undated: parse_var("EVICT_UNDATED").unwrap_or(defaults.evict_undated),
        }
    }

    /// Name of the long-lived namespace for static assets.
    pub fn static_cache_name(&self) -> String {
        format!("static-{}", self.cache_version)
    }

    /// Name of the short-lived namespace for dynamic responses.
    pub fn dynamic_cache_name(&self) -> String {
        format!("dynamic-{}", self.cache_version)
    }

    /// Janitor retention window as a Duration.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days * 24 * 60 * 60)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            upstream_url: "http://127.0.0.1:8080".to_string(),
            site_origin: "http://127.0.0.1:8080".to_string(),
            cache_version: "v1".to_string(),
            precache_paths: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
            ],
            retention_days: 7,
            clean_interval: 24 * 60 * 60,
            slow_request_ms: 1000,
            evict_undated: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Returns `scheme://authority` of a URL, or the input unchanged if it has no scheme.
pub fn origin_of(url: &str) -> String {
    match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
            format!("{}{}", &url[..idx + 3], &rest[..end])
        }
        None => url.to_string(),
    }
}
