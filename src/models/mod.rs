//! Request and Response models for the management API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ControlMessage, PreloadRequest};
pub use responses::{DeleteCacheResponse, ErrorResponse, HealthResponse, StatusResponse};
