//! Cache Entry Module
//!
//! Defines the captured response stored under a request key.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

// == Cached Response ==
/// A captured response: status, headers and body, plus when it was stored.
///
/// Cloning is cheap, the body is reference counted.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers as received
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
    /// Capture timestamp (Unix milliseconds)
    pub stored_at: i64,
}

impl CachedResponse {
    // == Constructor ==
    /// Creates a response captured now.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            stored_at: current_timestamp_ms(),
        }
    }

    /// Synthetic response with a plain-text body and no upstream headers.
    pub fn synthetic(status: StatusCode, body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    /// The fixed response served when neither network nor cache can answer.
    pub fn offline() -> Self {
        Self::synthetic(StatusCode::SERVICE_UNAVAILABLE, "Offline")
    }

    /// The fixed response served when a stale-while-revalidate miss cannot reach the network.
    pub fn not_found() -> Self {
        Self::synthetic(StatusCode::NOT_FOUND, "Not Found")
    }

    // == Is Success ==
    /// True for 2xx responses, the only ones ever written to a namespace.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    // == Date ==
    /// Parses the `date` response header.
    ///
    /// Accepts the HTTP IMF-fixdate / RFC 2822 form and RFC 3339. Returns
    /// `None` when the header is missing or cannot be parsed.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        let raw = self.headers.get(header::DATE)?.to_str().ok()?.trim();

        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    /// Size of the stored body in bytes.
    pub fn size_bytes(&self) -> usize {
        self.body.len()
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn with_date(value: &str) -> CachedResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::DATE, HeaderValue::from_str(value).unwrap());
        CachedResponse::new(StatusCode::OK, headers, "body")
    }

    #[test]
    fn test_success_classification() {
        assert!(CachedResponse::new(StatusCode::OK, HeaderMap::new(), "").is_success());
        assert!(CachedResponse::new(StatusCode::NO_CONTENT, HeaderMap::new(), "").is_success());
        assert!(!CachedResponse::new(StatusCode::NOT_MODIFIED, HeaderMap::new(), "").is_success());
        assert!(!CachedResponse::new(StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new(), "").is_success());
    }

    #[test]
    fn test_parse_http_date() {
        let entry = with_date("Tue, 15 Nov 1994 08:12:31 GMT");
        let date = entry.date().unwrap();
        assert_eq!(date.to_rfc3339(), "1994-11-15T08:12:31+00:00");
    }

    #[test]
    fn test_parse_rfc3339_date() {
        let entry = with_date("2024-03-01T10:00:00Z");
        assert!(entry.date().is_some());
    }

    #[test]
    fn test_missing_or_garbage_date() {
        let entry = CachedResponse::new(StatusCode::OK, HeaderMap::new(), "body");
        assert!(entry.date().is_none());
        assert!(with_date("yesterday-ish").date().is_none());
    }

    #[test]
    fn test_synthetic_responses() {
        let offline = CachedResponse::offline();
        assert_eq!(offline.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(&offline.body[..], b"Offline");

        let missing = CachedResponse::not_found();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.size_bytes(), "Not Found".len());
    }

    #[test]
    fn test_into_response_keeps_status_and_headers() {
        let entry = with_date("Tue, 15 Nov 1994 08:12:31 GMT");
        let response = entry.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::DATE));
    }
}
