//! Metrics Collectors
//!
//! Each collector reads the resource cache for one concern and updates the
//! corresponding Prometheus metrics.
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Accept a `CollectionContext` holding the cache for the current cycle
//! - Resolve or refresh resources through the cache
//! - Update Prometheus metrics
//! - Return `CollectionResult` (Ok(Success) or Ok(Failed))
//!
//! # Error Handling
//!
//! Individual collector failures are non-fatal - they log warnings and return
//! `CollectionStatus::Failed`. Resources that turn out to be inaccessible are
//! simply absent from the output.

use crate::cache::ResourceCache;
use crate::metrics::MetricsCollector;
use tracing::{info, warn};

/// Shared context passed to all collectors
///
/// The cache is borrowed mutably for the whole cycle: lookups that miss add
/// resources, and resources found deleted upstream are evicted.
pub struct CollectionContext<'a, C> {
    /// Resource cache, already set up
    pub cache: &'a mut ResourceCache<C>,
    /// Metrics collector for updating Prometheus metrics
    pub metrics: &'a MetricsCollector,
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Metrics were successfully collected and updated
    Success,
    /// Collection failed but is non-fatal (already logged as warning)
    Failed,
}

/// Result type for collector functions
///
/// - `Ok(CollectionStatus::Success)` = Collection succeeded
/// - `Ok(CollectionStatus::Failed)` = Collection failed but non-fatal (logged as warning)
/// - `Err(_)` = Fatal error (should propagate)
pub type CollectionResult = Result<CollectionStatus, anyhow::Error>;

/// Runs `query_future` and hands its output to `process`.
///
/// - On success: processes data, logs success, returns `CollectionStatus::Success`
/// - On error: logs warning, returns `CollectionStatus::Failed` (non-fatal)
pub async fn collect_with_handler<T, F, P, E>(
    name: &str,
    query_future: F,
    process: P,
) -> CollectionResult
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: FnOnce(T),
{
    match query_future.await {
        Ok(data) => {
            process(data);
            info!("Updated {} metrics", name);
            Ok(CollectionStatus::Success)
        }
        Err(e) => {
            warn!("Failed to collect {}: {}", name, e);
            Ok(CollectionStatus::Failed)
        }
    }
}

pub mod cache;
pub mod nic;
pub mod resource;

pub use self::cache::collect_cache_metrics;
pub use nic::collect_nic_metrics;
pub use resource::collect_resource_metrics;
