//! sw_cache - A service-worker style caching proxy
//!
//! Intercepts site requests and serves them cache-first, network-first or
//! stale-while-revalidate according to a URL routing table, with an
//! on-demand janitor for old entries.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod strategy;
pub mod tasks;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
pub use worker::ServiceWorker;
