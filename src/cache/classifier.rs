//! URI classification.
//!
//! Every HMC object URI encodes its class and, for element objects, its
//! parent. The patterns are anchored at the start only, so a shorter shape
//! matches the prefix of a longer one; they are therefore tried from the most
//! nested shape to the least nested one and the first match wins. The adapter
//! shape is the exception: it precedes the port shape and is end-anchored.

use super::resource::ResourceClass;
use crate::error::{ExporterError, Result};
use regex::Regex;
use std::sync::OnceLock;

const PATTERNS: &[(&str, ResourceClass)] = &[
    (
        r"^(/api/storage-groups/[^/]+)/storage-volumes/[^/]+",
        ResourceClass::StorageVolume,
    ),
    (r"^/api/storage-groups/[^/]+", ResourceClass::StorageGroup),
    (r"^(/api/partitions/[^/]+)/nics/[^/]+", ResourceClass::Nic),
    (r"^/api/partitions/[^/]+", ResourceClass::Partition),
    (
        r"^/api/logical-partitions/[^/]+",
        ResourceClass::LogicalPartition,
    ),
    (r"^/api/adapters/[^/]+$", ResourceClass::Adapter),
    (
        r"^(/api/adapters/[^/]+)/(?:network|storage)-ports/[^/]+",
        ResourceClass::Port,
    ),
    (r"^/api/virtual-switches/[^/]+", ResourceClass::VirtualSwitch),
    (r"^/api/cpcs/[^/]+", ResourceClass::Cpc),
];

fn compiled() -> &'static [(Regex, ResourceClass)] {
    static COMPILED: OnceLock<Vec<(Regex, ResourceClass)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|(pattern, class)| {
                (
                    Regex::new(pattern).expect("URI pattern must be a valid regex"),
                    *class,
                )
            })
            .collect()
    })
}

/// Returns the resource class of `uri`.
pub fn classify(uri: &str) -> Result<ResourceClass> {
    compiled()
        .iter()
        .find(|(re, _)| re.is_match(uri))
        .map(|(_, class)| *class)
        .ok_or_else(|| ExporterError::UnrecognizedUri(uri.to_string()))
}

/// Returns the parent URI encoded in an element URI.
///
/// Only nics, ports and storage volumes carry their parent in their URI;
/// every other class yields `None`.
pub fn structural_parent(uri: &str) -> Option<String> {
    compiled()
        .iter()
        .find(|(re, _)| re.is_match(uri))
        .and_then(|(re, _)| re.captures(uri))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
