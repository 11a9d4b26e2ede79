use hmc_exporter::cache::{CacheStats, ResourceClass};
use hmc_exporter::metrics::MetricsCollector;
use std::collections::BTreeMap;

#[test]
fn test_metrics_registration() {
    // Verify that all metrics can be created and registered without panicking
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");

    let rendered = metrics.render();
    assert!(rendered.is_ok(), "Failed to render metrics");

    // Vec metrics only appear once they have values set
    let output = rendered.unwrap();
    assert!(output.contains("zhmc_up"), "Missing zhmc_up metric");
    assert!(
        output.contains("zhmc_cache_known_resources"),
        "Missing known resources metric"
    );
    assert!(
        output.contains("zhmc_cache_inaccessible_resources"),
        "Missing inaccessible resources metric"
    );
    assert!(
        output.contains("zhmc_cache_subscribed_resources"),
        "Missing subscribed resources metric"
    );
}

#[test]
fn test_custom_namespace() {
    let metrics = MetricsCollector::with_namespace("hmc").expect("Failed to create metrics");

    let output = metrics.render().unwrap();
    assert!(output.contains("hmc_up"));
    assert!(!output.contains("zhmc_up"));
}

#[test]
fn test_cache_stats_update() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");
    let stats = CacheStats {
        resources: BTreeMap::from([(ResourceClass::Partition, 3), (ResourceClass::Nic, 0)]),
        known: 7,
        inaccessible: 2,
        subscribed: 3,
        list_calls: 5,
        fetch_calls: 4,
    };

    metrics.update_cache_stats(&stats);

    let rendered = metrics.render().unwrap();
    assert!(rendered.contains("zhmc_cache_resources{class=\"partition\"} 3"));
    assert!(rendered.contains("zhmc_cache_resources{class=\"nic\"} 0"));
    assert!(rendered.contains("zhmc_cache_known_resources 7"));
    assert!(rendered.contains("zhmc_cache_inaccessible_resources 2"));
    assert!(rendered.contains("zhmc_cache_subscribed_resources 3"));
    assert!(rendered.contains("zhmc_cache_remote_calls{operation=\"list\"} 5"));
    assert!(rendered.contains("zhmc_cache_remote_calls{operation=\"fetch\"} 4"));
}

#[test]
fn test_reset_drops_per_resource_series() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");
    metrics.up.set(1.0);
    metrics
        .resource_info
        .with_label_values(&["partition-resource", "partition", "P1", "CPC1"])
        .set(1);
    metrics
        .nic_backing_port_info
        .with_label_values(&["P1", "N1", "OSA1", "0"])
        .set(1);

    metrics.reset();

    let rendered = metrics.render().unwrap();
    assert!(!rendered.contains("P1"), "resource series survived reset");
    assert!(rendered.contains("zhmc_up 1"), "up must not be reset");
}
