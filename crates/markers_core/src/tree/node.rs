//! Materialized tree node shapes.
//!
//! Nodes are plain snapshots: every refresh builds new instances. The
//! rendering layer reads them but writes UI state back through
//! `MarkerTree::set_expanded` / `MarkerTree::set_selected`.

use crate::model::marker::{Marker, MarkerInfo};
use std::rc::Rc;

/// Prefix of group node ids.
pub const GROUP_NODE_ID_PREFIX: &str = "markerFile-";

/// Entry point of one rendered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNode {
    pub id: String,
    pub name: String,
    /// Marker kind shown under this root.
    pub kind: String,
}

/// One resource carrying at least one marker of the root's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    /// `"markerFile-" + resource_id`.
    pub id: String,
    /// Display name of the resource (last path segment).
    pub name: String,
    pub resource_id: String,
    /// Id of the root this group was resolved under.
    pub root_id: String,
    pub kind: String,
    pub count: usize,
    pub expanded: bool,
}

impl GroupNode {
    pub(crate) fn from_info(info: MarkerInfo, root: &RootNode, expanded: bool) -> Self {
        Self {
            id: format!("{GROUP_NODE_ID_PREFIX}{}", info.resource_id),
            name: resource_display_name(&info.resource_id).to_string(),
            resource_id: info.resource_id,
            root_id: root.id.clone(),
            kind: root.kind.clone(),
            count: info.count,
            expanded,
        }
    }
}

/// One marker.
#[derive(Debug)]
pub struct LeafNode<T> {
    /// The marker id; stable for this exact marker instance. Unique only
    /// within one owner, so pair it with the resource id to address a leaf.
    pub id: String,
    pub marker: Rc<Marker<T>>,
    pub selected: bool,
}

impl<T> LeafNode<T> {
    pub(crate) fn new(marker: Rc<Marker<T>>, selected: bool) -> Self {
        Self {
            id: marker.id.clone(),
            marker,
            selected,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.marker.resource_id
    }
}

impl<T> Clone for LeafNode<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            marker: Rc::clone(&self.marker),
            selected: self.selected,
        }
    }
}

/// Any node of the two-level marker tree.
#[derive(Debug)]
pub enum TreeNode<T> {
    Root(RootNode),
    Group(GroupNode),
    Leaf(LeafNode<T>),
}

impl<T> TreeNode<T> {
    pub fn id(&self) -> &str {
        match self {
            Self::Root(node) => &node.id,
            Self::Group(node) => &node.id,
            Self::Leaf(node) => &node.id,
        }
    }

    /// Returns whether this node can have children.
    pub fn is_composite(&self) -> bool {
        !matches!(self, Self::Leaf(_))
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Self::Group(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode<T>> {
        match self {
            Self::Leaf(node) => Some(node),
            _ => None,
        }
    }
}

impl<T> Clone for TreeNode<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Root(node) => Self::Root(node.clone()),
            Self::Group(node) => Self::Group(node.clone()),
            Self::Leaf(node) => Self::Leaf(node.clone()),
        }
    }
}

/// Returns the last `/`-separated segment of `resource_id`.
///
/// Falls back to the whole id when no non-empty segment exists.
pub fn resource_display_name(resource_id: &str) -> &str {
    resource_id
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(resource_id)
}
