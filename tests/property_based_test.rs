//! Property-based tests using proptest
//!
//! Tests that verify cache properties hold for arbitrary metric group
//! selections and lookup sequences.

mod common;

use common::*;
use hmc_exporter::cache::{needs_auto_update, ResourceClass};
use hmc_exporter::config::MetricGroupKind;
use hmc_exporter::metrics::MetricsCollector;
use proptest::prelude::*;
use std::collections::BTreeSet;

const CLASS_NAMES: [&str; 9] = [
    "cpc",
    "adapter",
    "logical-partition",
    "partition",
    "nic",
    "virtual-switch",
    "port",
    "storage-group",
    "storage-volume",
];

fn kind_strategy() -> impl Strategy<Value = MetricGroupKind> {
    prop_oneof![Just(MetricGroupKind::Metric), Just(MetricGroupKind::Resource)]
}

fn groups_strategy() -> impl Strategy<Value = Vec<(usize, MetricGroupKind)>> {
    prop::collection::vec((0..CLASS_NAMES.len(), kind_strategy()), 1..8)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Failed to build runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_every_class_is_listed_at_most_once_per_parent(selection in groups_strategy()) {
        let groups: Vec<_> = selection
            .iter()
            .enumerate()
            .map(|(i, (class, kind))| group(&format!("group-{}", i), *kind, CLASS_NAMES[*class]))
            .collect();

        let (console, cache) = runtime().block_on(set_up(&groups));

        for class in ResourceClass::ALL {
            let parents = console.listed_parents(class);
            let distinct: BTreeSet<_> = parents.iter().collect();
            prop_assert_eq!(parents.len(), distinct.len(), "{} listed twice", class);
            if !parents.is_empty() {
                prop_assert!(cache.is_populated(class));
            }
        }
    }

    #[test]
    fn test_populated_classes_have_populated_dependencies(selection in groups_strategy()) {
        let groups: Vec<_> = selection
            .iter()
            .enumerate()
            .map(|(i, (class, kind))| group(&format!("group-{}", i), *kind, CLASS_NAMES[*class]))
            .collect();

        let (_console, cache) = runtime().block_on(set_up(&groups));

        for class in ResourceClass::ALL {
            if cache.is_populated(class) {
                for dependency in class.dependencies() {
                    prop_assert!(cache.is_populated(*dependency), "{} before {}", class, dependency);
                }
            }
        }
    }

    #[test]
    fn test_auto_update_matches_group_kinds(selection in groups_strategy()) {
        let groups: Vec<_> = selection
            .iter()
            .enumerate()
            .map(|(i, (class, kind))| group(&format!("group-{}", i), *kind, CLASS_NAMES[*class]))
            .collect();

        let (_console, cache) = runtime().block_on(set_up(&groups));

        for class in ResourceClass::ALL {
            let expected = needs_auto_update(
                groups
                    .iter()
                    .filter(|group| ResourceClass::from_name(&group.resource) == Some(class))
                    .map(|group| group.kind),
            );
            prop_assert_eq!(cache.is_auto_update_enabled_for_class(class), expected);
        }
    }

    #[test]
    fn test_repeated_lookups_of_missing_partitions_fetch_once(
        ids in prop::collection::vec("[a-z0-9]{1,8}", 1..10),
        repeats in 1usize..4,
    ) {
        let rt = runtime();
        let (console, mut cache) = rt.block_on(set_up(&[group(
            "partition-usage",
            MetricGroupKind::Metric,
            "partition",
        )]));

        let uris: BTreeSet<String> = ids.iter().map(|id| format!("/api/partitions/x-{}", id)).collect();
        for _ in 0..repeats {
            for uri in &uris {
                let entry = rt.block_on(cache.lookup(uri)).unwrap();
                prop_assert!(entry.is_inaccessible());
            }
        }

        for uri in &uris {
            prop_assert_eq!(console.fetch_count(uri), 1);
        }
        prop_assert_eq!(cache.stats().inaccessible, uris.len());
    }

    #[test]
    fn test_any_resource_name_renders_without_panic(name in "\\PC*") {
        let metrics = MetricsCollector::new().expect("Failed to create metrics");

        metrics
            .resource_info
            .with_label_values(&["partition-resource", "partition", name.as_str(), "CPC1"])
            .set(1);

        prop_assert!(metrics.render().is_ok());
    }
}

#[test]
fn test_needs_auto_update_truth_table() {
    use MetricGroupKind::{Metric, Resource};

    assert!(!needs_auto_update(Vec::<MetricGroupKind>::new()));
    assert!(!needs_auto_update([Metric, Metric]));
    assert!(needs_auto_update([Resource]));
    assert!(needs_auto_update([Metric, Resource, Metric]));
}
