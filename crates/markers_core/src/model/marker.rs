//! Marker record and per-resource aggregate.
//!
//! # Responsibility
//! - Carry one annotation attached to one resource by one owner.
//! - Describe per-resource marker counts for one kind.
//!
//! # Invariants
//! - `id` is unique within the owning collection and never reused.
//! - `MarkerInfo::count` is always >= 1; resources without markers are omitted.

use serde::{Deserialize, Serialize};

/// One annotation (e.g. a diagnostic) attached to a resource.
///
/// Minted only by `MarkerCollection::set_markers`; callers never build one
/// directly so ids stay unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker<T> {
    /// `owner + "_" + resource_id + "_" + sequence`.
    pub id: String,
    /// Resource identifier (usually a URI) the marker is attached to.
    pub resource_id: String,
    /// Producer identity of the owning collection.
    pub owner: String,
    /// Free-form category tag used for query filtering.
    pub kind: String,
    /// Producer payload, opaque to the registry.
    pub data: T,
}

impl<T> Marker<T> {
    pub(crate) fn new(
        id: String,
        resource_id: &str,
        owner: &str,
        kind: &str,
        data: T,
    ) -> Self {
        Self {
            id,
            resource_id: resource_id.to_string(),
            owner: owner.to_string(),
            kind: kind.to_string(),
            data,
        }
    }
}

/// Marker count for one resource, summed across all live collections of a kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerInfo {
    pub resource_id: String,
    pub count: usize,
}

/// Builds the marker id for `sequence` on `resource_id` under `owner`.
pub(crate) fn marker_id(owner: &str, resource_id: &str, sequence: u64) -> String {
    format!("{owner}_{resource_id}_{sequence}")
}
