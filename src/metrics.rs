//! Prometheus Metrics Definitions
//!
//! This module defines the Prometheus metrics exposed by the HMC exporter.
//!
//! # Metric Categories
//!
//! ## Exporter Health
//! - `up` - whether the last collection cycle succeeded
//!
//! ## Resource Cache
//! - Cached resources per class (target scope only)
//! - Known, inaccessible and live-updated resource counts
//! - Remote list and fetch calls issued by the cache
//!
//! ## Resource-Based Groups
//! - One info series per resource of each enabled resource-based group
//! - Backing adapter and port of each exported nic
//!
//! All metrics use the configured namespace prefix (`zhmc` by default).

use crate::cache::CacheStats;
use prometheus::{Encoder, Gauge, GaugeVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

pub const DEFAULT_NAMESPACE: &str = "zhmc";

/// Metrics collector for the HMC exporter
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Exporter health
    pub up: Arc<Gauge>,

    // Resource cache
    pub cache_resources: Arc<GaugeVec>,
    pub cache_known_resources: Arc<IntGauge>,
    pub cache_inaccessible_resources: Arc<IntGauge>,
    pub cache_subscribed_resources: Arc<IntGauge>,
    pub cache_remote_calls: Arc<IntGaugeVec>,

    // Resource-based groups
    pub resource_info: Arc<IntGaugeVec>,
    pub nic_backing_port_info: Arc<IntGaugeVec>,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(namespace: &str) -> anyhow::Result<Self> {
        let registry = Registry::new();

        let up = Gauge::with_opts(
            Opts::new("up", "Whether the last collection cycle succeeded (1=yes, 0=no)")
                .namespace(namespace),
        )?;

        // Resource cache metrics
        let cache_resources = GaugeVec::new(
            Opts::new(
                "cache_resources",
                "Number of cached resources in the target scope",
            )
            .namespace(namespace),
            &["class"],
        )?;

        let cache_known_resources = IntGauge::with_opts(
            Opts::new(
                "cache_known_resources",
                "Number of cached resources in or out of the target scope",
            )
            .namespace(namespace),
        )?;

        let cache_inaccessible_resources = IntGauge::with_opts(
            Opts::new(
                "cache_inaccessible_resources",
                "Number of URIs recorded as not found or not accessible",
            )
            .namespace(namespace),
        )?;

        let cache_subscribed_resources = IntGauge::with_opts(
            Opts::new(
                "cache_subscribed_resources",
                "Number of cached resources receiving live property updates",
            )
            .namespace(namespace),
        )?;

        let cache_remote_calls = IntGaugeVec::new(
            Opts::new(
                "cache_remote_calls",
                "Cumulative console calls issued by the resource cache",
            )
            .namespace(namespace),
            &["operation"],
        )?;

        // Resource-based group metrics
        let resource_info = IntGaugeVec::new(
            Opts::new(
                "resource_info",
                "Resource exported by a resource-based metric group (value is always 1)",
            )
            .namespace(namespace),
            &["metric_group", "class", "resource", "cpc"],
        )?;

        let nic_backing_port_info = IntGaugeVec::new(
            Opts::new(
                "nic_backing_port_info",
                "Adapter port backing a partition nic (value is always 1)",
            )
            .namespace(namespace),
            &["partition", "nic", "adapter", "port"],
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(cache_resources.clone()))?;
        registry.register(Box::new(cache_known_resources.clone()))?;
        registry.register(Box::new(cache_inaccessible_resources.clone()))?;
        registry.register(Box::new(cache_subscribed_resources.clone()))?;
        registry.register(Box::new(cache_remote_calls.clone()))?;
        registry.register(Box::new(resource_info.clone()))?;
        registry.register(Box::new(nic_backing_port_info.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            up: Arc::new(up),
            cache_resources: Arc::new(cache_resources),
            cache_known_resources: Arc::new(cache_known_resources),
            cache_inaccessible_resources: Arc::new(cache_inaccessible_resources),
            cache_subscribed_resources: Arc::new(cache_subscribed_resources),
            cache_remote_calls: Arc::new(cache_remote_calls),
            resource_info: Arc::new(resource_info),
            nic_backing_port_info: Arc::new(nic_backing_port_info),
        })
    }

    /// Set a labelled gauge
    pub fn set_gauge(&self, gauge: &GaugeVec, labels: &[&str], value: f64) {
        gauge.with_label_values(labels).set(value);
    }

    /// Publish a snapshot of the resource cache
    pub fn update_cache_stats(&self, stats: &CacheStats) {
        for (class, count) in &stats.resources {
            self.set_gauge(&self.cache_resources, &[class.as_str()], *count as f64);
        }
        self.cache_known_resources.set(stats.known as i64);
        self.cache_inaccessible_resources
            .set(stats.inaccessible as i64);
        self.cache_subscribed_resources.set(stats.subscribed as i64);
        self.cache_remote_calls
            .with_label_values(&["list"])
            .set(stats.list_calls as i64);
        self.cache_remote_calls
            .with_label_values(&["fetch"])
            .set(stats.fetch_calls as i64);
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Reset per-resource series before a fresh cycle, so removed resources
    /// disappear from the output.
    pub fn reset(&self) {
        self.resource_info.reset();
        self.nic_backing_port_info.reset();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics collector")
    }
}
