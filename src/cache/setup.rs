//! Dependency-driven population.
//!
//! `setup()` resolves the resource class of every enabled metric group and
//! populates each class. A populate routine records the class's auto-update
//! decision, returns early if the class is already populated, populates the
//! classes it depends on, and only then lists its own resources. Every
//! routine is idempotent, so the order in which classes are requested does
//! not matter and no class is ever listed twice.

use super::{EnabledGroup, Resource, ResourceCache, ResourceClass};
use crate::config::{MetricGroupDefinition, MetricGroupKind};
use crate::console::{ConsoleClient, RawResource};
use crate::error::{ExporterError, Result};
use futures_util::future::BoxFuture;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Property naming the CPC of a partition in console-wide listings.
const LISTING_CPC_PROPERTY: &str = "cpc-object-uri";

impl<C: ConsoleClient> ResourceCache<C> {
    /// Populates every class needed by `enabled` and its dependencies.
    ///
    /// An unknown resource class in the metric-group metadata is a
    /// configuration error. Listing errors are returned as is and leave the
    /// cache partially populated; the session cannot continue in that case.
    pub async fn setup(&mut self, enabled: &[MetricGroupDefinition]) -> Result<()> {
        if self.setup_done {
            warn!("Resource cache is already set up, ignoring repeated setup");
            return Ok(());
        }

        let mut groups = Vec::with_capacity(enabled.len());
        for group in enabled {
            let class = ResourceClass::from_name(&group.resource).ok_or_else(|| {
                ExporterError::Config(format!(
                    "metric group {} references unknown resource class {:?}",
                    group.name, group.resource
                ))
            })?;
            groups.push(EnabledGroup {
                name: group.name.clone(),
                kind: group.kind,
                class,
            });
        }
        self.enabled_groups = groups;

        let classes: BTreeSet<ResourceClass> =
            self.enabled_groups.iter().map(|group| group.class).collect();
        for class in classes {
            self.populate(class).await?;
        }

        self.resource_groups = self
            .enabled_groups
            .iter()
            .filter(|group| group.kind == MetricGroupKind::Resource)
            .map(|group| (group.name.clone(), group.class))
            .collect();
        self.setup_done = true;

        info!(
            "Resource cache set up: {} resources in scope, {} remote list calls",
            self.target_index.len(),
            self.list_calls
        );
        Ok(())
    }

    /// Resources of a resource-based metric group, read from the per-class
    /// index. Empty for metric-based or unknown groups.
    pub fn resources_for_metric_group(&self, name: &str) -> Vec<Arc<Resource>> {
        self.resource_groups
            .get(name)
            .map(|class| self.resources_of_class(*class))
            .unwrap_or_default()
    }

    /// Names of the enabled resource-based metric groups.
    pub fn resource_metric_groups(&self) -> impl Iterator<Item = (&str, ResourceClass)> {
        self.resource_groups
            .iter()
            .map(|(name, class)| (name.as_str(), *class))
    }

    pub fn is_populated(&self, class: ResourceClass) -> bool {
        self.populated.contains(&class)
    }

    /// Populates `class` after its dependencies, once.
    pub fn populate(&mut self, class: ResourceClass) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.record_auto_update(class);
            if self.populated.contains(&class) {
                return Ok(());
            }

            for dependency in class.dependencies() {
                self.populate(*dependency).await?;
            }

            debug!("Populating {} resources", class);
            match class {
                ResourceClass::Cpc => self.populate_cpcs().await?,
                ResourceClass::Adapter => self.populate_adapters().await?,
                ResourceClass::LogicalPartition => self.populate_logical_partitions().await?,
                ResourceClass::Partition => self.populate_partitions().await?,
                ResourceClass::Nic => self.populate_nics().await?,
                ResourceClass::VirtualSwitch => self.populate_virtual_switches().await?,
                ResourceClass::Port => self.populate_ports().await?,
                ResourceClass::StorageGroup => self.populate_storage_groups().await?,
                ResourceClass::StorageVolume => self.populate_storage_volumes().await?,
            }
            self.populated.insert(class);

            info!(
                "Populated {} resources: {} in scope",
                class,
                self.class_index.get(&class).map_or(0, |index| index.len())
            );
            Ok(())
        })
    }

    async fn list(&mut self, class: ResourceClass, parent: Option<&str>) -> Result<Vec<RawResource>> {
        self.list_calls += 1;
        self.client.list_resources(class, parent).await
    }

    async fn add_listed(&mut self, class: ResourceClass, raw: RawResource, parent: Option<String>) {
        let parent = parent.or_else(|| {
            raw.properties
                .get("parent")
                .or_else(|| raw.properties.get(LISTING_CPC_PROPERTY))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });
        self.add_resource(Resource::new(raw.uri, class, raw.properties, parent))
            .await;
    }

    /// Lists `class` once per target CPC.
    async fn populate_per_target_cpc(&mut self, class: ResourceClass) -> Result<()> {
        for cpc in self.targets.uris() {
            for raw in self.list(class, Some(&cpc)).await? {
                self.add_listed(class, raw, Some(cpc.clone())).await;
            }
        }
        Ok(())
    }

    async fn populate_cpcs(&mut self) -> Result<()> {
        for raw in self.list(ResourceClass::Cpc, None).await? {
            self.add_listed(ResourceClass::Cpc, raw, None).await;
        }
        Ok(())
    }

    async fn populate_adapters(&mut self) -> Result<()> {
        self.populate_per_target_cpc(ResourceClass::Adapter).await
    }

    async fn populate_logical_partitions(&mut self) -> Result<()> {
        self.populate_per_target_cpc(ResourceClass::LogicalPartition)
            .await
    }

    /// Partitions are listed console-wide so that the all-partitions index
    /// holds every permitted partition, whatever its CPC.
    async fn populate_partitions(&mut self) -> Result<()> {
        for raw in self.list(ResourceClass::Partition, None).await? {
            self.add_listed(ResourceClass::Partition, raw, None).await;
        }
        Ok(())
    }

    /// Walks all partitions and lists the nics of those in scope.
    async fn populate_nics(&mut self) -> Result<()> {
        let partitions: Vec<Arc<Resource>> = self
            .all_partitions
            .iter()
            .filter_map(|uri| self.cached(uri))
            .filter(|partition| self.is_in_target_scope(partition))
            .collect();

        for partition in partitions {
            let parent = partition.uri().to_string();
            for raw in self.list(ResourceClass::Nic, Some(&parent)).await? {
                self.add_listed(ResourceClass::Nic, raw, Some(parent.clone()))
                    .await;
            }
        }
        Ok(())
    }

    async fn populate_virtual_switches(&mut self) -> Result<()> {
        self.populate_per_target_cpc(ResourceClass::VirtualSwitch)
            .await
    }

    async fn populate_ports(&mut self) -> Result<()> {
        let adapters: Vec<String> = self
            .class_index
            .get(&ResourceClass::Adapter)
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        for adapter in adapters {
            for raw in self.list(ResourceClass::Port, Some(&adapter)).await? {
                self.add_listed(ResourceClass::Port, raw, Some(adapter.clone()))
                    .await;
            }
        }
        Ok(())
    }

    /// Storage groups have no per-CPC listing; they are listed once for the
    /// whole console and tied to their CPC by `cpc-uri`.
    async fn populate_storage_groups(&mut self) -> Result<()> {
        for raw in self.list(ResourceClass::StorageGroup, None).await? {
            self.add_listed(ResourceClass::StorageGroup, raw, None)
                .await;
        }
        Ok(())
    }

    /// Walks all storage groups and lists the volumes of those in scope.
    async fn populate_storage_volumes(&mut self) -> Result<()> {
        let groups: Vec<String> = self
            .all_storage_groups
            .iter()
            .filter_map(|uri| self.cached(uri))
            .filter(|group| self.is_in_target_scope(group))
            .map(|group| group.uri().to_string())
            .collect();

        for group in groups {
            for raw in self.list(ResourceClass::StorageVolume, Some(&group)).await? {
                self.add_listed(ResourceClass::StorageVolume, raw, Some(group.clone()))
                    .await;
            }
        }
        Ok(())
    }
}
