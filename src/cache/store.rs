//! Arena, indexes and eviction.

use super::classifier;
use super::{CacheEntry, Resource, ResourceCache, ResourceClass};
use crate::console::ConsoleClient;
use crate::error::Result;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest owner chain in the class graph is volume → group → cpc.
const MAX_OWNER_DEPTH: usize = 4;

/// The CPCs selected for export, fixed for the lifetime of a cache.
#[derive(Debug, Clone, Default)]
pub struct TargetScope {
    cpcs: HashSet<String>,
}

impl TargetScope {
    pub fn new<I, S>(cpc_uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cpcs: cpc_uris.into_iter().map(Into::into).collect(),
        }
    }

    /// Lists the console's CPCs and keeps those named in `names`, or all of
    /// them when `names` is empty.
    pub async fn resolve<C: ConsoleClient>(client: &C, names: &[String]) -> Result<Self> {
        let cpcs = client.list_resources(ResourceClass::Cpc, None).await?;
        let mut selected = HashSet::new();

        for cpc in cpcs {
            let name = cpc
                .properties
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if names.is_empty() || names.iter().any(|n| n == name) {
                info!("Targeting CPC {} ({})", name, cpc.uri);
                selected.insert(cpc.uri);
            }
        }

        if selected.is_empty() {
            warn!("No CPC matched the configured targets {:?}", names);
        }
        Ok(Self { cpcs: selected })
    }

    pub fn contains(&self, cpc_uri: &str) -> bool {
        self.cpcs.contains(cpc_uri)
    }

    pub fn len(&self) -> usize {
        self.cpcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpcs.is_empty()
    }

    /// Target CPC URIs in a stable order.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.cpcs.iter().cloned().collect();
        uris.sort();
        uris
    }
}

/// Snapshot of cache contents and remote traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// In-scope resources per class.
    pub resources: BTreeMap<ResourceClass, usize>,
    /// URIs known to exist, in scope or not.
    pub known: usize,
    pub inaccessible: usize,
    pub subscribed: usize,
    pub list_calls: u64,
    pub fetch_calls: u64,
}

/// URI of the resource owning `resource` one level up.
///
/// Storage groups are tied to their CPC through the `cpc-uri` property, not
/// a structural parent link.
fn owner_uri(resource: &Resource) -> Option<String> {
    match resource.class() {
        ResourceClass::Cpc => None,
        ResourceClass::StorageGroup => resource.property_str("cpc-uri"),
        _ => resource.parent_uri().map(str::to_string),
    }
}

impl<C: ConsoleClient> ResourceCache<C> {
    /// The cached entry for `uri`, without contacting the console.
    pub fn get(&self, uri: &str) -> Option<&CacheEntry> {
        self.entries.get(uri)
    }

    /// The cached resource for `uri`, if present and accessible.
    pub fn cached(&self, uri: &str) -> Option<Arc<Resource>> {
        self.entries.get(uri).and_then(CacheEntry::resource).cloned()
    }

    /// URI of the CPC owning `resource`, walking parent links and the
    /// storage group association. The CPC itself need not be cached.
    pub fn cpc_uri_of(&self, resource: &Resource) -> Option<String> {
        if resource.class() == ResourceClass::Cpc {
            return Some(resource.uri().to_string());
        }

        let mut uri = owner_uri(resource)?;
        for _ in 0..MAX_OWNER_DEPTH {
            match self.cached(&uri) {
                Some(owner) if owner.class() == ResourceClass::Cpc => return Some(uri),
                Some(owner) => uri = owner_uri(&owner)?,
                None => {
                    return match classifier::classify(&uri) {
                        Ok(ResourceClass::Cpc) => Some(uri),
                        _ => None,
                    }
                }
            }
        }
        None
    }

    /// The cached CPC owning `resource`.
    pub fn cpc_of(&self, resource: &Resource) -> Option<Arc<Resource>> {
        self.cpc_uri_of(resource).and_then(|uri| self.cached(&uri))
    }

    pub fn is_in_target_scope(&self, resource: &Resource) -> bool {
        self.cpc_uri_of(resource)
            .is_some_and(|cpc| self.targets.contains(&cpc))
    }

    /// In-scope resources of `class`.
    pub fn resources_of_class(&self, class: ResourceClass) -> Vec<Arc<Resource>> {
        self.class_index
            .get(&class)
            .into_iter()
            .flatten()
            .filter_map(|uri| self.cached(uri))
            .collect()
    }

    /// URIs of every in-scope resource, whatever its class.
    pub fn target_scope_uris(&self) -> impl Iterator<Item = &str> {
        self.target_index.iter().map(String::as_str)
    }

    /// Inserts `resource` into the arena and every index that must hold it,
    /// then subscribes it for live updates if its class asks for them.
    ///
    /// A URI that is already cached keeps its existing object.
    pub(super) async fn add_resource(&mut self, resource: Resource) -> Arc<Resource> {
        if let Some(existing) = self.cached(resource.uri()) {
            return existing;
        }

        let resource = Arc::new(resource);
        let uri = resource.uri().to_string();
        let class = resource.class();

        self.entries
            .insert(uri.clone(), CacheEntry::Resource(Arc::clone(&resource)));

        match class {
            ResourceClass::Partition => {
                self.all_partitions.insert(uri.clone());
            }
            ResourceClass::StorageGroup => {
                self.all_storage_groups.insert(uri.clone());
            }
            _ => {}
        }

        if self.is_in_target_scope(&resource) {
            self.class_index
                .entry(class)
                .or_default()
                .insert(uri.clone());
            self.target_index.insert(uri.clone());
        }

        if self.policy.is_enabled(class) {
            match self.client.enable_auto_update(&resource).await {
                Ok(()) => {
                    resource.set_auto_update(true);
                    self.subscribed.insert(uri.clone());
                }
                Err(e) => warn!(
                    "Cannot enable auto-update for {} {} ({}), its values will be pulled: {}",
                    class,
                    resource.name(),
                    uri,
                    e
                ),
            }
        }

        debug!("Cached {} {} ({})", class, resource.name(), uri);
        resource
    }

    /// Records `uri` as permanently inaccessible.
    pub(super) fn mark_inaccessible(&mut self, uri: &str) -> CacheEntry {
        info!("Resource {} is not found or not accessible, ignoring it", uri);
        self.entries.insert(uri.to_string(), CacheEntry::Inaccessible);
        CacheEntry::Inaccessible
    }

    /// Evicts a resource deleted upstream.
    ///
    /// Missing index entries are logged and ignored.
    pub async fn remove(&mut self, uri: &str) {
        let class = match classifier::classify(uri) {
            Ok(class) => class,
            Err(e) => {
                warn!("Ignoring removal of {}: {}", uri, e);
                return;
            }
        };

        let removed = self.entries.remove(uri);
        if removed.is_none() {
            debug!("Removed {} was not cached", uri);
        }
        if !self.target_index.remove(uri) {
            debug!("Removed {} was not in the target scope index", uri);
        }
        match class {
            ResourceClass::Partition => {
                self.all_partitions.remove(uri);
            }
            ResourceClass::StorageGroup => {
                self.all_storage_groups.remove(uri);
            }
            _ => {}
        }
        let in_class_index = self
            .class_index
            .get_mut(&class)
            .is_some_and(|index| index.remove(uri));
        if !in_class_index {
            debug!("Removed {} was not in the {} index", uri, class);
        }

        if self.subscribed.remove(uri) {
            self.client.disable_auto_update(uri).await;
            if let Some(resource) = removed.as_ref().and_then(CacheEntry::resource) {
                resource.set_auto_update(false);
            }
        }

        info!("Removed {} {} from the resource cache", class, uri);
    }

    /// Evicts every resource the console reported deleted since the last
    /// call. Returns the number of URIs processed.
    pub async fn evict_removed(&mut self) -> usize {
        let removed = self.client.take_removed();
        for uri in &removed {
            self.remove(uri).await;
        }
        removed.len()
    }

    pub fn stats(&self) -> CacheStats {
        let resources = ResourceClass::ALL
            .iter()
            .map(|class| {
                let count = self.class_index.get(class).map_or(0, |index| index.len());
                (*class, count)
            })
            .collect();
        let inaccessible = self
            .entries
            .values()
            .filter(|entry| entry.is_inaccessible())
            .count();

        CacheStats {
            resources,
            known: self.entries.len() - inaccessible,
            inaccessible,
            subscribed: self.subscribed.len(),
            list_calls: self.list_calls,
            fetch_calls: self.fetch_calls,
        }
    }
}
