//! Worker lifecycle states.

use std::fmt;

use serde::Serialize;

/// Lifecycle of the cache manager.
///
/// Only an `Active` worker intercepts requests; in every other state requests
/// go straight to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Constructed, nothing pre-cached yet
    Parsed,
    /// Fetching the install-time asset list
    Installing,
    /// Install finished (successfully or not), waiting to activate
    Installed,
    /// Removing namespaces of previous versions
    Activating,
    /// Intercepting and serving requests
    Active,
}

impl Lifecycle {
    pub fn is_active(self) -> bool {
        self == Lifecycle::Active
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Parsed => "parsed",
            Lifecycle::Installing => "installing",
            Lifecycle::Installed => "installed",
            Lifecycle::Activating => "activating",
            Lifecycle::Active => "active",
        };
        f.write_str(name)
    }
}
