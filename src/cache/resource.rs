//! Resource objects held by the cache.
//!
//! A [`Resource`] is stored exactly once, in the cache arena, behind an `Arc`.
//! Its property set is an immutable snapshot that is swapped as a whole, so a
//! push-update task can install new values while the collection path reads
//! the previous ones without ever observing a half-written set.

use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raw property map as returned by the console.
pub type Properties = serde_json::Map<String, Value>;

/// The closed set of resource classes the cache knows about.
///
/// `Port` covers both network ports and storage ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceClass {
    Cpc,
    Adapter,
    LogicalPartition,
    Partition,
    Nic,
    VirtualSwitch,
    Port,
    StorageGroup,
    StorageVolume,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 9] = [
        ResourceClass::Cpc,
        ResourceClass::Adapter,
        ResourceClass::LogicalPartition,
        ResourceClass::Partition,
        ResourceClass::Nic,
        ResourceClass::VirtualSwitch,
        ResourceClass::Port,
        ResourceClass::StorageGroup,
        ResourceClass::StorageVolume,
    ];

    /// Classes that must be populated before this one can be.
    pub fn dependencies(self) -> &'static [ResourceClass] {
        use ResourceClass::*;
        match self {
            Cpc => &[],
            Adapter => &[Cpc],
            LogicalPartition => &[Cpc],
            Partition => &[Cpc, StorageGroup],
            Nic => &[Partition, Adapter, Port, VirtualSwitch],
            VirtualSwitch => &[Cpc],
            Port => &[Adapter],
            StorageGroup => &[Cpc],
            StorageVolume => &[StorageGroup],
        }
    }

    /// Parses the resource name used in metric-group metadata.
    pub fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "cpc" => ResourceClass::Cpc,
            "adapter" => ResourceClass::Adapter,
            "logical-partition" => ResourceClass::LogicalPartition,
            "partition" => ResourceClass::Partition,
            "nic" => ResourceClass::Nic,
            "virtual-switch" => ResourceClass::VirtualSwitch,
            "port" | "network-port" | "storage-port" => ResourceClass::Port,
            "storage-group" => ResourceClass::StorageGroup,
            "storage-volume" => ResourceClass::StorageVolume,
            _ => return None,
        };
        Some(class)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceClass::Cpc => "cpc",
            ResourceClass::Adapter => "adapter",
            ResourceClass::LogicalPartition => "logical-partition",
            ResourceClass::Partition => "partition",
            ResourceClass::Nic => "nic",
            ResourceClass::VirtualSwitch => "virtual-switch",
            ResourceClass::Port => "port",
            ResourceClass::StorageGroup => "storage-group",
            ResourceClass::StorageVolume => "storage-volume",
        }
    }

    /// Element objects (nics, ports, storage volumes) have no
    /// property-selection support on their GET operation.
    pub fn supports_property_selection(self) -> bool {
        !matches!(
            self,
            ResourceClass::Nic | ResourceClass::Port | ResourceClass::StorageVolume
        )
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached remote resource.
#[derive(Debug)]
pub struct Resource {
    uri: String,
    class: ResourceClass,
    parent: Option<String>,
    properties: RwLock<Arc<Properties>>,
    auto_update: AtomicBool,
}

impl Resource {
    pub fn new(
        uri: impl Into<String>,
        class: ResourceClass,
        properties: Properties,
        parent: Option<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            class,
            parent,
            properties: RwLock::new(Arc::new(properties)),
            auto_update: AtomicBool::new(false),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// URI of the structural parent (CPC for adapters and partitions,
    /// partition for nics, adapter for ports, storage group for volumes).
    pub fn parent_uri(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The `name` property, falling back to the URI when it was not fetched.
    pub fn name(&self) -> String {
        self.property_str("name").unwrap_or_else(|| self.uri.clone())
    }

    /// Current property snapshot.
    pub fn properties(&self) -> Arc<Properties> {
        Arc::clone(&self.properties.read())
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties.read().get(name).cloned()
    }

    pub fn property_str(&self, name: &str) -> Option<String> {
        self.properties
            .read()
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Installs a complete new snapshot.
    pub fn replace_properties(&self, properties: Properties) {
        *self.properties.write() = Arc::new(properties);
    }

    /// Installs a new snapshot made of the current one overlaid with `changes`.
    pub fn merge_properties(&self, changes: Properties) {
        let mut guard = self.properties.write();
        let mut merged = (**guard).clone();
        merged.extend(changes);
        *guard = Arc::new(merged);
    }

    pub fn auto_update_enabled(&self) -> bool {
        self.auto_update.load(Ordering::Acquire)
    }

    pub(crate) fn set_auto_update(&self, enabled: bool) {
        self.auto_update.store(enabled, Ordering::Release);
    }
}

/// What the cache holds for a URI once it has been looked at.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    Resource(Arc<Resource>),
    /// The console answered "not found / no access"; never retried.
    Inaccessible,
}

impl CacheEntry {
    pub fn resource(&self) -> Option<&Arc<Resource>> {
        match self {
            CacheEntry::Resource(resource) => Some(resource),
            CacheEntry::Inaccessible => None,
        }
    }

    pub fn is_inaccessible(&self) -> bool {
        matches!(self, CacheEntry::Inaccessible)
    }
}
