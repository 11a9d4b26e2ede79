//! Resource Cache Metrics Collector
//!
//! # Metrics Produced
//! - `zhmc_cache_resources` - In-scope cached resources
//!   - Labels: class
//! - `zhmc_cache_known_resources` - Cached resources in or out of scope
//! - `zhmc_cache_inaccessible_resources` - URIs recorded as inaccessible
//! - `zhmc_cache_subscribed_resources` - Resources with live updates
//! - `zhmc_cache_remote_calls` - Console calls issued by the cache
//!   - Labels: operation

use super::{CollectionContext, CollectionResult, CollectionStatus};
use crate::console::ConsoleClient;

pub async fn collect_cache_metrics<C: ConsoleClient>(
    ctx: &mut CollectionContext<'_, C>,
) -> CollectionResult {
    ctx.metrics.update_cache_stats(&ctx.cache.stats());
    Ok(CollectionStatus::Success)
}
