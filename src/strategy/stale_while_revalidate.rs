//! Stale-while-revalidate strategy for frequently updated images.

use tracing::debug;

use crate::cache::CachedResponse;
use crate::error::Result;
use crate::fetch::FetchRequest;
use crate::strategy::StrategyContext;

/// Returns the cached copy at once while a concurrent fetch refreshes it.
///
/// The fetch always starts. Its failures are swallowed: with a cached copy
/// they only mean "no update", without one the caller gets a synthetic 404.
pub async fn stale_while_revalidate(
    ctx: &StrategyContext,
    request: &FetchRequest,
) -> Result<CachedResponse> {
    let key = request.key();
    let cached = ctx.storage.match_in(&ctx.static_cache, &key).await;

    let revalidate = {
        let ctx = ctx.clone();
        let request = request.clone();
        tokio::spawn(async move {
            match ctx.fetcher.fetch(&request).await {
                Ok(response) => {
                    ctx.storage
                        .put(&ctx.static_cache, request.key(), response.clone())
                        .await;
                    Some(response)
                }
                Err(e) => {
                    debug!("Revalidation of {} failed: {}", request.url, e);
                    None
                }
            }
        })
    };

    if let Some(cached) = cached {
        debug!("stale-while-revalidate hit {}", key);
        return Ok(cached);
    }

    debug!("stale-while-revalidate miss {}", key);
    match revalidate.await {
        Ok(Some(response)) => Ok(response),
        Ok(None) => Ok(CachedResponse::not_found()),
        Err(e) => {
            debug!("Revalidation task for {} ended abnormally: {}", key, e);
            Ok(CachedResponse::not_found())
        }
    }
}
