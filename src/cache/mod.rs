//! Resource Cache
//!
//! Translates the opaque resource URIs found in metric records into cached,
//! hierarchically related [`Resource`] objects while keeping round trips to the
//! console low.
//!
//! # Architecture
//!
//! ```text
//!  setup(groups) ──► populate(class) ──► dependencies first ──► list + add
//!                                                                   │
//!  lookup(uri) ──► hit ─────────────────────────────────────────────┤
//!       └──► miss ──► add(uri) ──► classify ──► parent lookup ──► fetch
//!                                                                   │
//!                                  ┌────────────────────────────────┘
//!                                  ▼
//!         arena: uri ──► Resource | Inaccessible
//!         indexes (uris only): per class, target scope,
//!                              all partitions, all storage groups
//! ```
//!
//! # Modules
//!
//! - [`classifier`] - URI shape to resource class
//! - [`resource`] - resource objects and cache entries
//! - `store` - arena, indexes, scope, eviction
//! - `policy` - auto-update decisions per class
//! - `setup` - dependency-driven population
//! - `fetch` - lazy lookup of unseen URIs
//! - `backing` - backing adapter and port of a nic
//!
//! The cache is driven from a single logical path: `setup()` once, then
//! `lookup()` / `remove()` interleaved with metric processing. Only property
//! snapshots are touched from elsewhere (the live-update task).

pub mod classifier;
pub mod resource;

mod backing;
mod fetch;
mod policy;
mod setup;
mod store;

pub use backing::BackingAdapter;
pub use policy::{needs_auto_update, AutoUpdatePolicy};
pub use resource::{CacheEntry, Properties, Resource, ResourceClass};
pub use store::{CacheStats, TargetScope};

use crate::config::MetricGroupKind;
use crate::console::ConsoleClient;
use crate::error::{ExporterError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// An enabled metric group with its resource class resolved.
#[derive(Debug, Clone)]
struct EnabledGroup {
    name: String,
    kind: MetricGroupKind,
    class: ResourceClass,
}

/// Identity-keyed, lazily populated index of console resources.
///
/// Every resource lives once in the arena (`entries`); the other indexes
/// hold URIs only.
pub struct ResourceCache<C> {
    client: Arc<C>,
    targets: TargetScope,

    entries: HashMap<String, CacheEntry>,
    class_index: HashMap<ResourceClass, BTreeSet<String>>,
    target_index: BTreeSet<String>,
    all_partitions: BTreeSet<String>,
    all_storage_groups: BTreeSet<String>,
    subscribed: HashSet<String>,

    policy: AutoUpdatePolicy,
    populated: HashSet<ResourceClass>,
    enabled_groups: Vec<EnabledGroup>,
    resource_groups: BTreeMap<String, ResourceClass>,
    setup_done: bool,

    list_calls: u64,
    fetch_calls: u64,
}

impl<C: ConsoleClient> ResourceCache<C> {
    pub fn new(client: Arc<C>, targets: TargetScope) -> Self {
        Self {
            client,
            targets,
            entries: HashMap::new(),
            class_index: HashMap::new(),
            target_index: BTreeSet::new(),
            all_partitions: BTreeSet::new(),
            all_storage_groups: BTreeSet::new(),
            subscribed: HashSet::new(),
            policy: AutoUpdatePolicy::default(),
            populated: HashSet::new(),
            enabled_groups: Vec::new(),
            resource_groups: BTreeMap::new(),
            setup_done: false,
            list_calls: 0,
            fetch_calls: 0,
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn is_set_up(&self) -> bool {
        self.setup_done
    }

    fn ensure_setup(&self, operation: &'static str) -> Result<()> {
        if self.setup_done {
            Ok(())
        } else {
            Err(ExporterError::NotSetUp(operation))
        }
    }
}
