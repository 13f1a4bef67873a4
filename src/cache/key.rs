//! Request Key Module
//!
//! Normalized identity of an intercepted request inside a namespace.

use std::fmt;

use axum::http::Method;

// == Request Key ==
/// Cache key made of the request method and its URL.
///
/// The URL fragment never reaches the network, so it is stripped; the query
/// string is kept because it selects a different resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Request method
    pub method: Method,
    /// Absolute request URL without fragment
    pub url: String,
}

impl RequestKey {
    // == Constructor ==
    /// Creates a key from a method and URL, normalizing the URL.
    pub fn new(method: Method, url: impl AsRef<str>) -> Self {
        let url = url.as_ref();
        let url = match url.find('#') {
            Some(idx) => &url[..idx],
            None => url,
        };

        Self {
            method,
            url: url.to_string(),
        }
    }

    /// Shorthand for a GET key, the only method the strategies cache.
    pub fn get(url: impl AsRef<str>) -> Self {
        Self::new(Method::GET, url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
