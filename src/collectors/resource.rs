//! Resource-Based Group Collector
//!
//! Exports the resources of every enabled resource-based metric group.
//! Resources that receive live updates are read as they are; the others are
//! pulled from the console first. A resource the console no longer knows is
//! evicted from the cache and drops out of the output.
//!
//! # Metrics Produced
//! - `zhmc_resource_info` - Resource of a resource-based group (always 1)
//!   - Labels: metric_group, class, resource, cpc

use super::{CollectionContext, CollectionResult, CollectionStatus};
use crate::cache::{Resource, ResourceCache, ResourceClass};
use crate::console::ConsoleClient;
use std::sync::Arc;
use tracing::{debug, info, warn};

fn needs_pull<C: ConsoleClient>(
    cache: &ResourceCache<C>,
    class: ResourceClass,
    resource: &Resource,
) -> bool {
    !cache.is_auto_update_enabled_for_class(class) || !resource.auto_update_enabled()
}

/// Pulls current properties of `resources`; returns false if any pull failed
/// for a reason other than the resource being gone.
async fn pull_properties<C: ConsoleClient>(
    ctx: &mut CollectionContext<'_, C>,
    resources: &[Arc<Resource>],
) -> bool {
    let client = Arc::clone(ctx.cache.client());
    let mut all_ok = true;

    for resource in resources {
        match client.fetch_properties(resource.uri(), None).await {
            Ok(props) => resource.merge_properties(props),
            Err(e) if e.is_inaccessible() => {
                info!("{} {} disappeared upstream", resource.class(), resource.uri());
                ctx.cache.remove(resource.uri()).await;
            }
            Err(e) => {
                warn!("Failed to pull properties of {}: {}", resource.uri(), e);
                all_ok = false;
            }
        }
    }
    all_ok
}

pub async fn collect_resource_metrics<C: ConsoleClient>(
    ctx: &mut CollectionContext<'_, C>,
) -> CollectionResult {
    let evicted = ctx.cache.evict_removed().await;
    if evicted > 0 {
        debug!("Evicted {} resources deleted upstream", evicted);
    }

    let groups: Vec<(String, ResourceClass)> = ctx
        .cache
        .resource_metric_groups()
        .map(|(name, class)| (name.to_string(), class))
        .collect();

    let mut status = CollectionStatus::Success;
    for (group, class) in groups {
        let pull: Vec<Arc<Resource>> = {
            let cache = &*ctx.cache;
            cache
                .resources_for_metric_group(&group)
                .into_iter()
                .filter(|resource| needs_pull(cache, class, resource))
                .collect()
        };
        if !pull.is_empty() {
            debug!("Pulling {} {} resources for {}", pull.len(), class, group);
            if !pull_properties(ctx, &pull).await {
                status = CollectionStatus::Failed;
            }
        }

        for resource in ctx.cache.resources_for_metric_group(&group) {
            let cpc = ctx
                .cache
                .cpc_of(&resource)
                .map(|cpc| cpc.name())
                .unwrap_or_default();
            ctx.metrics
                .resource_info
                .with_label_values(&[&group, class.as_str(), &resource.name(), &cpc])
                .set(1);
        }
    }

    Ok(status)
}
