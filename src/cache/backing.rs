//! Backing adapter resolution for nics.
//!
//! Older console generations back a nic with a virtual switch, which names
//! the adapter and port. Newer ones reference the adapter port directly. Both
//! topologies stay supported since which one applies is only known once the
//! nic is inspected.

use super::{CacheEntry, Resource, ResourceCache};
use crate::console::ConsoleClient;
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Physical adapter and port behind a nic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingAdapter {
    pub adapter_name: String,
    pub port_index: i64,
}

fn index_property(resource: &Resource, name: &str) -> Option<i64> {
    match resource.property(name)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl<C: ConsoleClient> ResourceCache<C> {
    /// Resolves the adapter and port backing `nic`.
    ///
    /// Returns `None` when a link in the chain is missing or inaccessible.
    pub async fn backing_adapter(&mut self, nic: &Resource) -> Result<Option<BackingAdapter>> {
        if let Some(vswitch_uri) = nic.property_str("virtual-switch-uri") {
            return self.backing_via_virtual_switch(nic, &vswitch_uri).await;
        }
        if let Some(port_uri) = nic.property_str("network-adapter-port-uri") {
            return self.backing_via_port(nic, &port_uri).await;
        }
        debug!("Nic {} references neither a virtual switch nor a port", nic.uri());
        Ok(None)
    }

    async fn backing_via_virtual_switch(
        &mut self,
        nic: &Resource,
        vswitch_uri: &str,
    ) -> Result<Option<BackingAdapter>> {
        let Some(vswitch) = self.resolve(vswitch_uri).await? else {
            debug!("Virtual switch {} of nic {} is inaccessible", vswitch_uri, nic.uri());
            return Ok(None);
        };
        if !self
            .ensure_properties(&vswitch, &["backing-adapter-uri", "port"])
            .await?
        {
            return Ok(None);
        }

        let Some(adapter_uri) = vswitch.property_str("backing-adapter-uri") else {
            return Ok(None);
        };
        let Some(adapter) = self.resolve(&adapter_uri).await? else {
            return Ok(None);
        };

        Ok(index_property(&vswitch, "port").map(|port_index| BackingAdapter {
            adapter_name: adapter.name(),
            port_index,
        }))
    }

    async fn backing_via_port(
        &mut self,
        nic: &Resource,
        port_uri: &str,
    ) -> Result<Option<BackingAdapter>> {
        let Some(port) = self.resolve(port_uri).await? else {
            debug!("Port {} of nic {} is inaccessible", port_uri, nic.uri());
            return Ok(None);
        };
        if !self.ensure_properties(&port, &["index"]).await? {
            return Ok(None);
        }

        let Some(adapter_uri) = port.parent_uri().map(str::to_string) else {
            return Ok(None);
        };
        let Some(adapter) = self.resolve(&adapter_uri).await? else {
            return Ok(None);
        };

        Ok(index_property(&port, "index").map(|port_index| BackingAdapter {
            adapter_name: adapter.name(),
            port_index,
        }))
    }

    async fn resolve(&mut self, uri: &str) -> Result<Option<Arc<Resource>>> {
        Ok(match self.lookup(uri).await? {
            CacheEntry::Resource(resource) => Some(resource),
            CacheEntry::Inaccessible => None,
        })
    }

    /// Fetches `names` into the resource's snapshot if any of them is absent.
    ///
    /// Returns false when the console no longer knows the resource; it is then
    /// evicted and recorded as inaccessible so it is not asked for again.
    async fn ensure_properties(&mut self, resource: &Resource, names: &[&str]) -> Result<bool> {
        let snapshot = resource.properties();
        if names.iter().all(|name| snapshot.contains_key(*name)) {
            return Ok(true);
        }
        match self.fetch(resource.uri(), resource.class(), names).await? {
            Some(props) => {
                resource.merge_properties(props);
                Ok(true)
            }
            None => {
                self.remove(resource.uri()).await;
                self.mark_inaccessible(resource.uri());
                Ok(false)
            }
        }
    }
}
