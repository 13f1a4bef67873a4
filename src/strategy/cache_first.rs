//! Cache-first strategy for long-lived static assets.

use tracing::debug;

use crate::cache::CachedResponse;
use crate::error::Result;
use crate::fetch::FetchRequest;
use crate::strategy::StrategyContext;

/// Serves from the static namespace, falling back to the network on a miss.
///
/// A hit is returned without waiting on the network; a detached task fetches
/// a fresh copy and overwrites the entry for the next request. A miss is
/// fetched, stored (2xx only) and returned. Network errors on a miss
/// propagate to the caller.
pub async fn cache_first(ctx: &StrategyContext, request: &FetchRequest) -> Result<CachedResponse> {
    let key = request.key();

    if let Some(cached) = ctx.storage.match_in(&ctx.static_cache, &key).await {
        debug!("cache-first hit {}", key);
        spawn_refresh(ctx.clone(), request.clone());
        return Ok(cached);
    }

    debug!("cache-first miss {}", key);
    let response = ctx.fetcher.fetch(request).await?;
    ctx.storage
        .put(&ctx.static_cache, key, response.clone())
        .await;
    Ok(response)
}

/// Fetches and overwrites the static entry without blocking the caller.
fn spawn_refresh(ctx: StrategyContext, request: FetchRequest) {
    tokio::spawn(async move {
        match ctx.fetcher.fetch(&request).await {
            Ok(response) => {
                ctx.storage
                    .put(&ctx.static_cache, request.key(), response)
                    .await;
            }
            Err(e) => debug!("Background refresh of {} failed: {}", request.url, e),
        }
    });
}
