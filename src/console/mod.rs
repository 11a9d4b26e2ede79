//! Remote console collaborator.
//!
//! The cache only talks to the console through [`ConsoleClient`], so the
//! REST implementation in [`client`] can be swapped for an in-memory double
//! in tests.

pub mod client;
pub mod types;

pub use client::RestConsoleClient;
pub use types::RawResource;

use crate::cache::{Properties, Resource, ResourceClass};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Operations the resource cache needs from the console.
#[async_trait]
pub trait ConsoleClient: Send + Sync {
    /// Lists the resources of `class`, scoped to `parent` where the console
    /// API lists per parent, or console-wide when `parent` is `None`.
    async fn list_resources(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
    ) -> Result<Vec<RawResource>>;

    /// Fetches the properties of a single resource, restricted to `selected`
    /// when given.
    ///
    /// A "not found / no access" answer must surface as an error for which
    /// [`ExporterError::is_inaccessible`](crate::error::ExporterError::is_inaccessible)
    /// returns true.
    async fn fetch_properties(&self, uri: &str, selected: Option<&[&str]>) -> Result<Properties>;

    /// Subscribes the resource for live property updates.
    async fn enable_auto_update(&self, resource: &Arc<Resource>) -> Result<()>;

    /// Drops a live-update subscription. Unknown URIs are ignored.
    async fn disable_auto_update(&self, uri: &str);

    /// URIs of subscribed resources found deleted upstream since the last
    /// call. The cache evicts them on the collection path.
    fn take_removed(&self) -> Vec<String> {
        Vec::new()
    }
}
