//! Auto-update policy.
//!
//! A class gets live updates when at least one enabled metric group reading
//! that class is resource-based. Metric-based groups are served by the
//! console metrics service and only need names and parentage, which never
//! change during a session.

use super::{ResourceCache, ResourceClass};
use crate::config::MetricGroupKind;
use crate::console::ConsoleClient;
use std::collections::HashMap;
use tracing::debug;

/// True iff one of `kinds` is a resource-based group.
pub fn needs_auto_update<I>(kinds: I) -> bool
where
    I: IntoIterator<Item = MetricGroupKind>,
{
    kinds
        .into_iter()
        .any(|kind| kind == MetricGroupKind::Resource)
}

/// Per-session auto-update decisions, one per class.
#[derive(Debug, Default, Clone)]
pub struct AutoUpdatePolicy {
    decisions: HashMap<ResourceClass, bool>,
}

impl AutoUpdatePolicy {
    pub fn record(&mut self, class: ResourceClass, enabled: bool) {
        self.decisions.insert(class, enabled);
    }

    /// Classes never recorded are pull-only.
    pub fn is_enabled(&self, class: ResourceClass) -> bool {
        self.decisions.get(&class).copied().unwrap_or(false)
    }
}

impl<C: ConsoleClient> ResourceCache<C> {
    /// Records the decision for `class` from the enabled metric groups.
    pub(super) fn record_auto_update(&mut self, class: ResourceClass) {
        let enabled = needs_auto_update(
            self.enabled_groups
                .iter()
                .filter(|group| group.class == class)
                .map(|group| group.kind),
        );
        self.policy.record(class, enabled);
        debug!("Auto-update for {} resources: {}", class, enabled);
    }

    pub fn is_auto_update_enabled_for_class(&self, class: ResourceClass) -> bool {
        self.policy.is_enabled(class)
    }
}
