//! Cache Module
//!
//! Named cache namespaces holding captured responses keyed by request.

mod entry;
mod key;
mod stats;
mod storage;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CachedResponse};
pub use key::RequestKey;
pub use stats::CacheStats;
pub use storage::{CacheStorage, NamespaceStatus, StorageStatus};
