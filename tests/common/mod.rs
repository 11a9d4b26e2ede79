//! In-memory console double shared by the cache test suites.

#![allow(dead_code)]

use async_trait::async_trait;
use hmc_exporter::cache::{Properties, Resource, ResourceCache, ResourceClass, TargetScope};
use hmc_exporter::config::{MetricGroupDefinition, MetricGroupKind};
use hmc_exporter::console::{ConsoleClient, RawResource};
use hmc_exporter::error::{ExporterError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const CPC1: &str = "/api/cpcs/c1";
pub const CPC2: &str = "/api/cpcs/c2";
pub const ADAPTER1: &str = "/api/adapters/a1";
pub const ADAPTER2: &str = "/api/adapters/a2";
pub const PORT0: &str = "/api/adapters/a1/network-ports/0";
pub const PARTITION1: &str = "/api/partitions/p1";
pub const PARTITION2: &str = "/api/partitions/p2";
pub const NIC_VSWITCH: &str = "/api/partitions/p1/nics/n1";
pub const NIC_PORT: &str = "/api/partitions/p1/nics/n2";
pub const VSWITCH1: &str = "/api/virtual-switches/v1";
pub const GROUP1: &str = "/api/storage-groups/g1";
pub const GROUP2: &str = "/api/storage-groups/g2";
pub const VOLUME1: &str = "/api/storage-groups/g1/storage-volumes/v1";
pub const VOLUME2: &str = "/api/storage-groups/g2/storage-volumes/v2";

pub fn props(value: Value) -> Properties {
    value.as_object().cloned().expect("properties must be a JSON object")
}

pub fn not_found(uri: &str) -> ExporterError {
    ExporterError::ConsoleApi {
        status: 404,
        reason: 1,
        message: format!("{} not found", uri),
    }
}

pub fn unavailable(uri: &str) -> ExporterError {
    ExporterError::ConsoleApi {
        status: 503,
        reason: 0,
        message: format!("{} temporarily unavailable", uri),
    }
}

type ListingKey = (ResourceClass, Option<String>);

/// Console double: listings and objects are configured up front, every call
/// is recorded.
#[derive(Default)]
pub struct MockConsole {
    listings: Mutex<HashMap<ListingKey, Vec<RawResource>>>,
    objects: Mutex<HashMap<String, Properties>>,
    transient: Mutex<HashSet<String>>,
    failing_lists: Mutex<HashSet<ResourceClass>>,
    refuse_subscriptions: Mutex<bool>,
    list_calls: Mutex<Vec<ListingKey>>,
    fetch_calls: Mutex<Vec<String>>,
    subscribed: Mutex<HashSet<String>>,
    removed: Mutex<Vec<String>>,
}

impl MockConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object reachable by fetch and, through `listed_under`,
    /// by listing.
    pub fn add(
        &self,
        class: ResourceClass,
        listed_under: Option<&str>,
        uri: &str,
        properties: Value,
    ) -> &Self {
        let properties = props(properties);
        self.objects.lock().insert(uri.to_string(), properties.clone());
        self.listings
            .lock()
            .entry((class, listed_under.map(str::to_string)))
            .or_default()
            .push(RawResource::new(uri, properties));
        self
    }

    /// Registers an object reachable by fetch only.
    pub fn add_unlisted(&self, uri: &str, properties: Value) -> &Self {
        self.objects.lock().insert(uri.to_string(), props(properties));
        self
    }

    pub fn delete(&self, uri: &str) {
        self.objects.lock().remove(uri);
    }

    pub fn fail_transiently(&self, uri: &str) {
        self.transient.lock().insert(uri.to_string());
    }

    pub fn recover(&self, uri: &str) {
        self.transient.lock().remove(uri);
    }

    pub fn fail_listing(&self, class: ResourceClass) {
        self.failing_lists.lock().insert(class);
    }

    /// Deletes `uri` the way a live-update notification reports it.
    pub fn delete_notified(&self, uri: &str) {
        self.delete(uri);
        self.removed.lock().push(uri.to_string());
    }

    pub fn refuse_subscriptions(&self) {
        *self.refuse_subscriptions.lock() = true;
    }

    pub fn list_count(&self, class: ResourceClass) -> usize {
        self.list_calls
            .lock()
            .iter()
            .filter(|(listed, _)| *listed == class)
            .count()
    }

    pub fn listed_parents(&self, class: ResourceClass) -> Vec<Option<String>> {
        self.list_calls
            .lock()
            .iter()
            .filter(|(listed, _)| *listed == class)
            .map(|(_, parent)| parent.clone())
            .collect()
    }

    pub fn fetch_count(&self, uri: &str) -> usize {
        self.fetch_calls.lock().iter().filter(|u| *u == uri).count()
    }

    pub fn total_fetches(&self) -> usize {
        self.fetch_calls.lock().len()
    }

    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.subscribed.lock().contains(uri)
    }
}

#[async_trait]
impl ConsoleClient for MockConsole {
    async fn list_resources(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
    ) -> Result<Vec<RawResource>> {
        let key = (class, parent.map(str::to_string));
        self.list_calls.lock().push(key.clone());
        if self.failing_lists.lock().contains(&class) {
            return Err(unavailable(&format!("{} listing", class)));
        }
        Ok(self.listings.lock().get(&key).cloned().unwrap_or_default())
    }

    async fn fetch_properties(&self, uri: &str, selected: Option<&[&str]>) -> Result<Properties> {
        self.fetch_calls.lock().push(uri.to_string());
        if self.transient.lock().contains(uri) {
            return Err(unavailable(uri));
        }
        let all = self
            .objects
            .lock()
            .get(uri)
            .cloned()
            .ok_or_else(|| not_found(uri))?;
        Ok(match selected {
            Some(names) => all
                .into_iter()
                .filter(|(key, _)| names.contains(&key.as_str()))
                .collect(),
            None => all,
        })
    }

    async fn enable_auto_update(&self, resource: &Arc<Resource>) -> Result<()> {
        if *self.refuse_subscriptions.lock() {
            return Err(ExporterError::ConsoleApi {
                status: 409,
                reason: 0,
                message: "notification channel unavailable".to_string(),
            });
        }
        self.subscribed.lock().insert(resource.uri().to_string());
        Ok(())
    }

    async fn disable_auto_update(&self, uri: &str) {
        self.subscribed.lock().remove(uri);
    }

    fn take_removed(&self) -> Vec<String> {
        std::mem::take(&mut *self.removed.lock())
    }
}

/// Two CPCs, of which only CPC1 is targeted.
///
/// CPC1 has adapter a1 with port 0, partition p1 with a nic backed by
/// virtual switch v1 and a nic backed by port 0 directly, storage group g1
/// with volume v1 and no logical partitions. CPC2 has partition p2 and
/// storage group g2 with volume v2.
pub fn standard_console() -> MockConsole {
    use ResourceClass::*;
    let console = MockConsole::new();
    console
        .add(Cpc, None, CPC1, json!({"object-uri": CPC1, "name": "CPC1"}))
        .add(Cpc, None, CPC2, json!({"object-uri": CPC2, "name": "CPC2"}))
        .add(
            Adapter,
            Some(CPC1),
            ADAPTER1,
            json!({"object-uri": ADAPTER1, "name": "OSA1", "parent": CPC1}),
        )
        .add(
            Port,
            Some(ADAPTER1),
            PORT0,
            json!({"element-uri": PORT0, "name": "Port 0", "index": 0, "parent": ADAPTER1}),
        )
        .add(
            Partition,
            None,
            PARTITION1,
            json!({"object-uri": PARTITION1, "name": "P1", "parent": CPC1}),
        )
        .add(
            Partition,
            None,
            PARTITION2,
            json!({"object-uri": PARTITION2, "name": "P2", "parent": CPC2}),
        )
        .add(
            Nic,
            Some(PARTITION1),
            NIC_VSWITCH,
            json!({
                "element-uri": NIC_VSWITCH,
                "name": "N1",
                "parent": PARTITION1,
                "virtual-switch-uri": VSWITCH1,
            }),
        )
        .add(
            Nic,
            Some(PARTITION1),
            NIC_PORT,
            json!({
                "element-uri": NIC_PORT,
                "name": "N2",
                "parent": PARTITION1,
                "virtual-switch-uri": null,
                "network-adapter-port-uri": PORT0,
            }),
        )
        .add(
            VirtualSwitch,
            Some(CPC1),
            VSWITCH1,
            json!({
                "object-uri": VSWITCH1,
                "name": "VS1",
                "parent": CPC1,
                "backing-adapter-uri": ADAPTER1,
                "port": 1,
            }),
        )
        .add(
            StorageGroup,
            None,
            GROUP1,
            json!({"object-uri": GROUP1, "name": "SG1", "cpc-uri": CPC1}),
        )
        .add(
            StorageGroup,
            None,
            GROUP2,
            json!({"object-uri": GROUP2, "name": "SG2", "cpc-uri": CPC2}),
        )
        .add(
            StorageVolume,
            Some(GROUP1),
            VOLUME1,
            json!({"element-uri": VOLUME1, "name": "VOL1"}),
        )
        .add(
            StorageVolume,
            Some(GROUP2),
            VOLUME2,
            json!({"element-uri": VOLUME2, "name": "VOL2"}),
        );
    console
}

pub fn group(name: &str, kind: MetricGroupKind, resource: &str) -> MetricGroupDefinition {
    MetricGroupDefinition::new(name, kind, resource)
}

pub fn cache_for(console: MockConsole) -> (Arc<MockConsole>, ResourceCache<MockConsole>) {
    let console = Arc::new(console);
    let cache = ResourceCache::new(Arc::clone(&console), TargetScope::new([CPC1]));
    (console, cache)
}

/// A cache over the standard console, set up with `groups`.
pub async fn set_up(
    groups: &[MetricGroupDefinition],
) -> (Arc<MockConsole>, ResourceCache<MockConsole>) {
    let (console, mut cache) = cache_for(standard_console());
    cache.setup(groups).await.expect("setup should succeed");
    (console, cache)
}
