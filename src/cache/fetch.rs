//! Lazy resolution of URIs not seen during setup.
//!
//! A miss is resolved parent first. If the parent turns out to be
//! inaccessible the child is marked inaccessible without asking the console.
//! "Not found / no access" answers are cached as permanent markers; any other
//! console error is returned uncached so the next lookup tries again.

use super::classifier;
use super::{CacheEntry, Properties, Resource, ResourceCache, ResourceClass};
use crate::console::ConsoleClient;
use crate::error::{ExporterError, Result};
use futures_util::future::BoxFuture;
use tracing::debug;

const CPC_PROPERTIES: &[&str] = &["name"];
const CHILD_OF_CPC_PROPERTIES: &[&str] = &["name", "parent"];
const STORAGE_GROUP_PROPERTIES: &[&str] = &["name", "cpc-uri"];
const VIRTUAL_SWITCH_PROPERTIES: &[&str] = &["name", "parent", "backing-adapter-uri", "port"];
const ELEMENT_PROPERTIES: &[&str] = &["name"];

impl<C: ConsoleClient> ResourceCache<C> {
    /// Returns the entry for `uri`, fetching it from the console on a miss.
    pub fn lookup<'a>(&'a mut self, uri: &'a str) -> BoxFuture<'a, Result<CacheEntry>> {
        Box::pin(async move {
            self.ensure_setup("lookup")?;
            if let Some(entry) = self.entries.get(uri) {
                return Ok(entry.clone());
            }
            self.add(uri).await
        })
    }

    /// Fetches `uri` and adds it to the cache, or records it as inaccessible.
    pub async fn add(&mut self, uri: &str) -> Result<CacheEntry> {
        self.ensure_setup("add")?;
        let class = classifier::classify(uri)?;
        debug!("Resolving {} {} on cache miss", class, uri);

        match class {
            ResourceClass::StorageVolume => self.add_element(uri, class).await,
            ResourceClass::StorageGroup => {
                self.add_owned(uri, class, STORAGE_GROUP_PROPERTIES, "cpc-uri")
                    .await
            }
            ResourceClass::Nic => self.add_element(uri, class).await,
            ResourceClass::Partition => {
                self.add_owned(uri, class, CHILD_OF_CPC_PROPERTIES, "parent")
                    .await
            }
            ResourceClass::LogicalPartition => {
                self.add_owned(uri, class, CHILD_OF_CPC_PROPERTIES, "parent")
                    .await
            }
            ResourceClass::Adapter => {
                self.add_owned(uri, class, CHILD_OF_CPC_PROPERTIES, "parent")
                    .await
            }
            ResourceClass::Port => self.add_element(uri, class).await,
            ResourceClass::VirtualSwitch => {
                self.add_owned(uri, class, VIRTUAL_SWITCH_PROPERTIES, "parent")
                    .await
            }
            ResourceClass::Cpc => self.add_cpc(uri).await,
        }
    }

    /// Fetches properties, mapping "not found / no access" to `Ok(None)`.
    pub(super) async fn fetch(
        &mut self,
        uri: &str,
        class: ResourceClass,
        selected: &[&str],
    ) -> Result<Option<Properties>> {
        self.fetch_calls += 1;
        let selected = class.supports_property_selection().then_some(selected);
        match self.client.fetch_properties(uri, selected).await {
            Ok(props) => Ok(Some(props)),
            Err(e) if e.is_inaccessible() => {
                debug!("Fetching {} failed: {}", uri, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn add_cpc(&mut self, uri: &str) -> Result<CacheEntry> {
        let Some(props) = self.fetch(uri, ResourceClass::Cpc, CPC_PROPERTIES).await? else {
            return Ok(self.mark_inaccessible(uri));
        };
        let resource = Resource::new(uri, ResourceClass::Cpc, props, None);
        Ok(CacheEntry::Resource(self.add_resource(resource).await))
    }

    /// Element objects carry their parent in their URI, so the parent is
    /// resolved before the element itself is fetched.
    async fn add_element(&mut self, uri: &str, class: ResourceClass) -> Result<CacheEntry> {
        let parent = classifier::structural_parent(uri)
            .ok_or_else(|| ExporterError::UnrecognizedUri(uri.to_string()))?;

        if self.lookup(&parent).await?.is_inaccessible() {
            debug!("Parent {} of {} is inaccessible", parent, uri);
            return Ok(self.mark_inaccessible(uri));
        }

        let Some(props) = self.fetch(uri, class, ELEMENT_PROPERTIES).await? else {
            return Ok(self.mark_inaccessible(uri));
        };
        let resource = Resource::new(uri, class, props, Some(parent));
        Ok(CacheEntry::Resource(self.add_resource(resource).await))
    }

    /// Objects name their owner in a property (`parent`, or `cpc-uri` for
    /// storage groups), so the owner is resolved after the fetch.
    async fn add_owned(
        &mut self,
        uri: &str,
        class: ResourceClass,
        selected: &[&str],
        owner_property: &str,
    ) -> Result<CacheEntry> {
        let Some(props) = self.fetch(uri, class, selected).await? else {
            return Ok(self.mark_inaccessible(uri));
        };

        let owner = props
            .get(owner_property)
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if let Some(owner) = owner.as_deref() {
            if self.lookup(owner).await?.is_inaccessible() {
                debug!("Owner {} of {} is inaccessible", owner, uri);
                return Ok(self.mark_inaccessible(uri));
            }
        }

        let parent = props
            .get("parent")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let resource = Resource::new(uri, class, props, parent);
        Ok(CacheEntry::Resource(self.add_resource(resource).await))
    }
}
