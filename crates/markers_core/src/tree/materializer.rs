//! Lazy two-level tree over a marker source.
//!
//! # Responsibility
//! - Derive root -> group -> leaf children on demand from registry queries.
//! - Carry UI state (`expanded`, `selected`) across full rebuilds.
//!
//! # Invariants
//! - Children are only computed when asked for; nothing is built eagerly.
//! - Cached lists are stamped with the source's change generation. Any
//!   change event invalidates them, even for handlers that run before this
//!   tree's own subscription, and the next resolve rebuilds from the source.
//! - Cached lists are a lookup for previous UI state, never a source of truth.
//! - Group state is matched by resource id. Leaf state is also matched by
//!   resource id, not marker id: the first previous leaf on the same resource
//!   wins, so `selected` can attach to a different marker after a rebuild.
//! - Resolving a node whose data is gone yields no children.
//! - Only nodes carrying this tree's root id and kind use the cache.

use crate::notify::Subscription;
use crate::registry::marker_registry::MarkerSource;
use crate::tree::node::{GroupNode, LeafNode, RootNode, TreeNode};
use log::{debug, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::{ready, Ready};

/// Default root node id.
pub const DEFAULT_ROOT_ID: &str = "markerTree";
/// Default root node name.
pub const DEFAULT_ROOT_NAME: &str = "MarkerTree";

/// Construction options for one tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    /// Marker kind shown by this view.
    pub kind: String,
    pub root_id: String,
    pub root_name: String,
}

impl TreeOptions {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            root_id: DEFAULT_ROOT_ID.to_string(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }

    /// Options for the built-in problems view.
    pub fn problems() -> Self {
        Self::new(crate::problem::PROBLEM_KIND)
    }
}

struct Snapshot<N> {
    generation: u64,
    nodes: Vec<N>,
}

struct TreeCache<T> {
    groups: Option<Snapshot<GroupNode>>,
    leaves: HashMap<String, Snapshot<LeafNode<T>>>,
}

/// Tree materializer bound to one marker source and one root.
///
/// Subscribes to the source on construction and unsubscribes when dropped.
pub struct MarkerTree<S: MarkerSource> {
    source: S,
    root: RootNode,
    cache: RefCell<TreeCache<S::Payload>>,
    _subscription: Subscription,
}

impl<S: MarkerSource> MarkerTree<S> {
    /// Creates a tree view over `source`.
    pub fn new(source: S, options: TreeOptions) -> Self {
        let root_id = options.root_id.clone();
        let subscription = source.on_markers_changed(move || {
            trace!("event=tree_invalidated module=tree root={root_id}");
        });

        Self {
            source,
            root: RootNode {
                id: options.root_id,
                name: options.root_name,
                kind: options.kind,
            },
            cache: RefCell::new(TreeCache {
                groups: None,
                leaves: HashMap::new(),
            }),
            _subscription: subscription,
        }
    }

    pub fn root(&self) -> &RootNode {
        &self.root
    }

    pub fn root_node(&self) -> TreeNode<S::Payload> {
        TreeNode::Root(self.root.clone())
    }

    /// Change generation of the source; cached lists older than this are stale.
    pub fn generation(&self) -> u64 {
        self.source.change_generation()
    }

    /// Resolves the children of `node`.
    ///
    /// Root -> one group per resource, group -> one leaf per marker,
    /// leaf -> nothing.
    pub fn children(&self, node: &TreeNode<S::Payload>) -> Vec<TreeNode<S::Payload>> {
        match node {
            TreeNode::Root(root) => self
                .groups_of(root)
                .into_iter()
                .map(TreeNode::Group)
                .collect(),
            TreeNode::Group(group) => self
                .leaves_of(group)
                .into_iter()
                .map(TreeNode::Leaf)
                .collect(),
            TreeNode::Leaf(_) => Vec::new(),
        }
    }

    /// Async-shaped `children`; the future is always immediately ready.
    pub fn resolve_children(
        &self,
        node: &TreeNode<S::Payload>,
    ) -> Ready<Vec<TreeNode<S::Payload>>> {
        ready(self.children(node))
    }

    /// Group children of this tree's root.
    pub fn groups(&self) -> Vec<GroupNode> {
        self.groups_of(&self.root)
    }

    /// Leaf children of `group`.
    pub fn leaves(&self, group: &GroupNode) -> Vec<LeafNode<S::Payload>> {
        self.leaves_of(group)
    }

    /// Records the expansion state of the group for `resource_id`.
    ///
    /// Returns `false` when the last emitted snapshot has no such group.
    pub fn set_expanded(&self, resource_id: &str, expanded: bool) -> bool {
        let mut cache = self.cache.borrow_mut();
        let Some(snapshot) = cache.groups.as_mut() else {
            return false;
        };
        match snapshot
            .nodes
            .iter_mut()
            .find(|node| node.resource_id == resource_id)
        {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    /// Records the selection state of the leaf for `marker_id` under the
    /// group of `resource_id`.
    ///
    /// Marker ids are only unique per owner, so the lookup is scoped to one
    /// resource. Returns `false` when that group's last emitted leaves have
    /// no such leaf.
    pub fn set_selected(&self, resource_id: &str, marker_id: &str, selected: bool) -> bool {
        let mut cache = self.cache.borrow_mut();
        let Some(snapshot) = cache.leaves.get_mut(resource_id) else {
            return false;
        };
        match snapshot.nodes.iter_mut().find(|node| node.id == marker_id) {
            Some(node) => {
                node.selected = selected;
                true
            }
            None => false,
        }
    }

    fn owns(&self, root_id: &str, kind: &str) -> bool {
        self.root.id == root_id && self.root.kind == kind
    }

    fn groups_of(&self, root: &RootNode) -> Vec<GroupNode> {
        if !self.owns(&root.id, &root.kind) {
            return self
                .source
                .marker_info_by_kind(&root.kind)
                .into_iter()
                .map(|info| GroupNode::from_info(info, root, false))
                .collect();
        }

        let generation = self.source.change_generation();
        if let Some(snapshot) = &self.cache.borrow().groups {
            if snapshot.generation == generation {
                return snapshot.nodes.clone();
            }
        }

        let infos = self.source.marker_info_by_kind(&root.kind);
        let mut cache = self.cache.borrow_mut();
        let nodes: Vec<GroupNode> = {
            let previous: HashMap<&str, bool> = cache
                .groups
                .iter()
                .flat_map(|snapshot| snapshot.nodes.iter())
                .map(|node| (node.resource_id.as_str(), node.expanded))
                .collect();
            infos
                .into_iter()
                .map(|info| {
                    let expanded = previous
                        .get(info.resource_id.as_str())
                        .copied()
                        .unwrap_or(false);
                    GroupNode::from_info(info, root, expanded)
                })
                .collect()
        };

        cache
            .leaves
            .retain(|resource_id, _| nodes.iter().any(|node| &node.resource_id == resource_id));
        cache.groups = Some(Snapshot {
            generation,
            nodes: nodes.clone(),
        });
        debug!(
            "event=tree_groups_resolved module=tree kind={} groups={} generation={}",
            root.kind,
            nodes.len(),
            generation
        );
        nodes
    }

    fn leaves_of(&self, group: &GroupNode) -> Vec<LeafNode<S::Payload>> {
        if !self.owns(&group.root_id, &group.kind) {
            return self
                .source
                .markers_by_resource_and_kind(&group.resource_id, &group.kind)
                .into_iter()
                .map(|marker| LeafNode::new(marker, false))
                .collect();
        }

        let generation = self.source.change_generation();
        if let Some(snapshot) = self.cache.borrow().leaves.get(&group.resource_id) {
            if snapshot.generation == generation {
                return snapshot.nodes.clone();
            }
        }

        let markers = self
            .source
            .markers_by_resource_and_kind(&group.resource_id, &group.kind);
        let mut cache = self.cache.borrow_mut();
        let nodes: Vec<LeafNode<S::Payload>> = {
            let mut previous = HashMap::<&str, bool>::new();
            if let Some(snapshot) = cache.leaves.get(&group.resource_id) {
                for node in &snapshot.nodes {
                    previous.entry(node.resource_id()).or_insert(node.selected);
                }
            }
            markers
                .into_iter()
                .map(|marker| {
                    let selected = previous
                        .get(marker.resource_id.as_str())
                        .copied()
                        .unwrap_or(false);
                    LeafNode::new(marker, selected)
                })
                .collect()
        };

        if nodes.is_empty() {
            cache.leaves.remove(&group.resource_id);
        } else {
            cache.leaves.insert(
                group.resource_id.clone(),
                Snapshot {
                    generation,
                    nodes: nodes.clone(),
                },
            );
        }
        trace!(
            "event=tree_leaves_resolved module=tree resource={} leaves={} generation={}",
            group.resource_id,
            nodes.len(),
            generation
        );
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkerTree, TreeOptions, DEFAULT_ROOT_ID};
    use crate::registry::marker_registry::MarkerRegistry;
    use crate::tree::node::{RootNode, TreeNode};

    #[test]
    fn options_default_root_identity() {
        let options = TreeOptions::problems();
        assert_eq!(options.kind, "problem");
        assert_eq!(options.root_id, DEFAULT_ROOT_ID);
    }

    #[test]
    fn change_events_bump_generation() {
        let registry = MarkerRegistry::<u8>::new();
        let collection = registry
            .create_collection("tsc", "problem")
            .expect("collection should register");
        let tree = MarkerTree::new(registry.clone(), TreeOptions::problems());

        collection.set_markers("file.ts", vec![1]);
        collection.set_markers("file.ts", vec![1]);
        assert_eq!(tree.generation(), 2);
    }

    #[test]
    fn cached_groups_are_reused_until_invalidated() {
        let registry = MarkerRegistry::<u8>::new();
        let collection = registry
            .create_collection("tsc", "problem")
            .expect("collection should register");
        collection.set_markers("file.ts", vec![1]);
        let tree = MarkerTree::new(registry.clone(), TreeOptions::problems());

        assert_eq!(tree.groups().len(), 1);
        assert!(tree.set_expanded("file.ts", true));
        assert!(tree.groups()[0].expanded);
        assert!(!tree.set_expanded("other.ts", true));
    }

    #[test]
    fn foreign_root_groups_do_not_touch_leaf_cache() {
        let registry = MarkerRegistry::<u8>::new();
        let collection = registry
            .create_collection("tsc", "problem")
            .expect("collection should register");
        collection.set_markers("file.ts", vec![1]);
        let tree = MarkerTree::new(registry.clone(), TreeOptions::problems());

        let own = tree.groups().remove(0);
        let leaf_id = tree.leaves(&own)[0].id.clone();
        assert!(tree.set_selected("file.ts", &leaf_id, true));

        let foreign_root = TreeNode::<u8>::Root(RootNode {
            id: "otherTree".to_string(),
            name: "Other".to_string(),
            kind: "problem".to_string(),
        });
        let foreign_groups = tree.children(&foreign_root);
        let foreign = foreign_groups[0].as_group().expect("group node");
        assert_eq!(foreign.root_id, "otherTree");
        assert!(!tree.leaves(foreign)[0].selected);

        collection.set_markers("file.ts", vec![1]);
        let own = tree.groups().remove(0);
        assert!(tree.leaves(&own)[0].selected);
    }

    #[test]
    fn dropping_tree_unsubscribes() {
        let registry = MarkerRegistry::<u8>::new();
        let collection = registry
            .create_collection("tsc", "problem")
            .expect("collection should register");
        let tree = MarkerTree::new(registry.clone(), TreeOptions::problems());
        assert_eq!(registry.change_subscriber_count(), 1);
        drop(tree);

        assert_eq!(registry.change_subscriber_count(), 0);
        collection.set_markers("file.ts", vec![1]);
    }
}
