//! Request DTOs for the management API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Control message posted to the worker (POST /__sw/message)
///
/// Tagged by its `type` field, e.g. `{"type": "CLEAN_CACHE"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Run the cache janitor over every namespace
    CleanCache,
}

/// Request body for POST /__sw/preload
///
/// Example: `{"cache": "images", "urls": ["/images/hero.png"]}`
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadRequest {
    /// Target namespace, defaults to `critical-resources`
    #[serde(default)]
    pub cache: Option<String>,
    /// Site paths or absolute URLs to fetch
    pub urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cache_deserialize() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type": "CLEAN_CACHE"}"#).unwrap();
        assert_eq!(msg, ControlMessage::CleanCache);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"type": "CLEAN_CACHE", "reason": "daily"}"#).unwrap();
        assert_eq!(msg, ControlMessage::CleanCache);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<ControlMessage, _> = serde_json::from_str(r#"{"type": "SKIP_WAITING"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_preload_request_deserialize() {
        let req: PreloadRequest =
            serde_json::from_str(r#"{"cache": "styles", "urls": ["/a.css", "/b.css"]}"#).unwrap();
        assert_eq!(req.cache.as_deref(), Some("styles"));
        assert_eq!(req.urls.len(), 2);

        let req: PreloadRequest = serde_json::from_str(r#"{"urls": ["/"]}"#).unwrap();
        assert!(req.cache.is_none());

        let missing: Result<PreloadRequest, _> = serde_json::from_str(r#"{"cache": "x"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_missing_type_rejected() {
        let result: Result<ControlMessage, _> = serde_json::from_str(r#"{}"#);
        assert!(result.is_err());
    }
}
