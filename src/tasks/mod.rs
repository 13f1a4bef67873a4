//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache cleanup trigger: runs the janitor at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
