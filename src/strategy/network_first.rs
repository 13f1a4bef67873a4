//! Network-first strategy for dynamic content.

use tracing::debug;

use crate::cache::CachedResponse;
use crate::error::Result;
use crate::fetch::FetchRequest;
use crate::strategy::StrategyContext;

/// Fetches from the network and stores 2xx responses in the dynamic namespace.
///
/// When the fetch fails outright, the dynamic namespace's copy is served if
/// there is one; otherwise the network error propagates.
pub async fn network_first(
    ctx: &StrategyContext,
    request: &FetchRequest,
) -> Result<CachedResponse> {
    let key = request.key();

    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            ctx.storage
                .put(&ctx.dynamic_cache, key, response.clone())
                .await;
            Ok(response)
        }
        Err(e) => {
            debug!("network-first fetch of {} failed: {}", key, e);
            match ctx.storage.match_in(&ctx.dynamic_cache, &key).await {
                Some(cached) => Ok(cached),
                None => Err(e),
            }
        }
    }
}
