//! Cache Janitor
//!
//! Evicts entries older than the retention window, judged by their `date` header.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheStorage, CachedResponse};

// == Janitor Report ==
/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JanitorReport {
    /// Namespaces visited
    pub namespaces: usize,
    /// Entries examined
    pub scanned: usize,
    /// Entries removed
    pub evicted: usize,
    /// Entries kept only because they carry no usable `date` header
    pub skipped_undated: usize,
}

// == Janitor ==
/// Sweeps every namespace and evicts entries past the retention window.
#[derive(Debug, Clone)]
pub struct Janitor {
    retention: Duration,
    evict_undated: bool,
}

impl Janitor {
    /// Creates a janitor.
    ///
    /// With `evict_undated`, entries lacking a `date` header are aged by the
    /// time they were stored instead of being kept forever.
    pub fn new(retention: Duration, evict_undated: bool) -> Self {
        Self {
            retention,
            evict_undated,
        }
    }

    // == Sweep ==
    /// Runs a sweep against the current time.
    pub async fn sweep(&self, storage: &CacheStorage) -> JanitorReport {
        self.sweep_at(storage, Utc::now()).await
    }

    /// Runs a sweep as if the current time were `now`.
    pub async fn sweep_at(&self, storage: &CacheStorage, now: DateTime<Utc>) -> JanitorReport {
        let mut report = JanitorReport::default();

        for name in storage.names().await {
            report.namespaces += 1;
            let mut scanned = 0;
            let mut undated = 0;

            let evicted = storage
                .evict_where(&name, |key, entry| {
                    scanned += 1;
                    match self.reference_time(entry) {
                        Some(date) => {
                            // Dates in the future have no age yet
                            let expired = (now - date)
                                .to_std()
                                .map(|age| age > self.retention)
                                .unwrap_or(false);
                            if expired {
                                debug!("Evicting {} from {} (dated {})", key, name, date);
                            }
                            expired
                        }
                        None => {
                            undated += 1;
                            false
                        }
                    }
                })
                .await;

            report.scanned += scanned;
            report.skipped_undated += undated;
            report.evicted += evicted;
        }

        info!(
            "Cache cleanup: scanned {} entries in {} namespaces, evicted {}, kept {} undated",
            report.scanned, report.namespaces, report.evicted, report.skipped_undated
        );
        report
    }

    fn reference_time(&self, entry: &CachedResponse) -> Option<DateTime<Utc>> {
        entry.date().or_else(|| {
            if self.evict_undated {
                Utc.timestamp_millis_opt(entry.stored_at).single()
            } else {
                None
            }
        })
    }
}
