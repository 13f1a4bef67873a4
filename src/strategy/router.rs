//! Routing Table
//!
//! Classifies request URLs into caching strategies.

use regex::Regex;

use crate::strategy::Strategy;

// == Pattern Groups ==
/// Patterns served cache-first: scripts, styles, fonts, and asset directories.
pub const CACHE_FIRST_PATTERNS: &[&str] = &[r"\.(?:js|css|woff2?|eot|ttf|otf)$", r"/assets/", r"/images/"];

/// Patterns served network-first: API calls and JSON documents.
pub const NETWORK_FIRST_PATTERNS: &[&str] = &[r"/api/", r"\.(?:json)$"];

/// Patterns served stale-while-revalidate: raster and vector images.
pub const STALE_WHILE_REVALIDATE_PATTERNS: &[&str] = &[r"\.(?:png|jpg|jpeg|svg|gif|webp|avif)$"];

/// Path extensions that make a cross-origin request worth intercepting.
const ASSET_PATH_PATTERN: &str = r"\.(js|css|png|jpg|jpeg|gif|svg|woff2?|eot|ttf|otf|webp|avif)$";

// == Routing Rule ==
/// A compiled URL pattern and the strategy it selects.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    pub pattern: Regex,
    pub strategy: Strategy,
}

// == Routing Table ==
/// Ordered routing rules; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    rules: Vec<RoutingRule>,
    asset_path: Regex,
    fallback: Strategy,
}

impl RoutingTable {
    // == Constructor ==
    /// Builds the table from ordered (pattern, strategy) pairs.
    ///
    /// Fails if any pattern is not a valid regular expression.
    pub fn new<'a, I>(rules: I, fallback: Strategy) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, Strategy)>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, strategy)| {
                Ok(RoutingRule {
                    pattern: Regex::new(pattern)?,
                    strategy,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            rules,
            asset_path: Regex::new(ASSET_PATH_PATTERN)?,
            fallback,
        })
    }

    /// The site's routing: cache-first group, then network-first, then
    /// stale-while-revalidate, falling back to network-first.
    pub fn standard() -> Self {
        let groups = CACHE_FIRST_PATTERNS
            .iter()
            .map(|p| (*p, Strategy::CacheFirst))
            .chain(NETWORK_FIRST_PATTERNS.iter().map(|p| (*p, Strategy::NetworkFirst)))
            .chain(
                STALE_WHILE_REVALIDATE_PATTERNS
                    .iter()
                    .map(|p| (*p, Strategy::StaleWhileRevalidate)),
            );

        // The built-in patterns are constant and known to compile.
        Self::new(groups, Strategy::NetworkFirst).expect("built-in routing patterns are valid")
    }

    // == Classify ==
    /// Returns the strategy for a full request URL (query string included).
    pub fn classify(&self, url: &str) -> Strategy {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(url))
            .map(|rule| rule.strategy)
            .unwrap_or(self.fallback)
    }

    // == Is Asset Request ==
    /// True if the URL path (query ignored) ends in a static-asset extension.
    pub fn is_asset_request(&self, url: &str) -> bool {
        self.asset_path.is_match(url_path(url))
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Extracts the path of an absolute or relative URL.
pub fn url_path(url: &str) -> &str {
    let without_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find(['/', '?', '#']) {
                Some(start) => &rest[start..],
                None => "",
            }
        }
        None => url,
    };

    let end = without_scheme
        .find(['?', '#'])
        .unwrap_or(without_scheme.len());
    &without_scheme[..end]
}
