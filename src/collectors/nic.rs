//! Nic Backing Port Collector
//!
//! # Metrics Produced
//! - `zhmc_nic_backing_port_info` - Adapter port behind a nic (always 1)
//!   - Labels: partition, nic, adapter, port

use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::cache::{BackingAdapter, ResourceCache, ResourceClass};
use crate::console::ConsoleClient;
use crate::error::Result;

struct NicPort {
    partition: String,
    nic: String,
    backing: BackingAdapter,
}

async fn resolve_nic_ports<C: ConsoleClient>(cache: &mut ResourceCache<C>) -> Result<Vec<NicPort>> {
    let mut rows = Vec::new();
    for nic in cache.resources_of_class(ResourceClass::Nic) {
        let Some(backing) = cache.backing_adapter(&nic).await? else {
            continue;
        };
        let partition = nic
            .parent_uri()
            .and_then(|uri| cache.cached(uri))
            .map(|partition| partition.name())
            .unwrap_or_default();
        rows.push(NicPort {
            partition,
            nic: nic.name(),
            backing,
        });
    }
    Ok(rows)
}

pub async fn collect_nic_metrics<C: ConsoleClient>(
    ctx: &mut CollectionContext<'_, C>,
) -> CollectionResult {
    let metrics = ctx.metrics;
    collect_with_handler("nic backing port", resolve_nic_ports(&mut *ctx.cache), |rows| {
        for row in rows {
            let port = row.backing.port_index.to_string();
            metrics
                .nic_backing_port_info
                .with_label_values(&[&row.partition, &row.nic, &row.backing.adapter_name, &port])
                .set(1);
        }
    })
    .await
}
