//! Per-owner marker storage.
//!
//! # Responsibility
//! - Store markers of one `(owner, kind)` pair indexed by resource id.
//! - Mint marker ids and signal the registry after every write.
//!
//! # Invariants
//! - A resource id with zero markers is never stored as a key.
//! - Per-resource sequence counters are never reset, so ids are never reused.
//! - The change notification fires after the internal update completes.

use crate::model::marker::{marker_id, Marker};
use crate::notify::ChangeNotifier;
use crate::registry::marker_registry::RegistryState;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

pub(crate) type SharedCollection<T> = Rc<RefCell<CollectionState<T>>>;

pub(crate) struct CollectionState<T> {
    owner: String,
    kind: String,
    resources: BTreeMap<String, Vec<Rc<Marker<T>>>>,
    sequences: HashMap<String, u64>,
    disposed: bool,
}

impl<T> CollectionState<T> {
    pub(crate) fn new(owner: &str, kind: &str) -> Self {
        Self {
            owner: owner.to_string(),
            kind: kind.to_string(),
            resources: BTreeMap::new(),
            sequences: HashMap::new(),
            disposed: false,
        }
    }

    pub(crate) fn kind(&self) -> &str {
        &self.kind
    }

    pub(crate) fn resources(&self) -> &BTreeMap<String, Vec<Rc<Marker<T>>>> {
        &self.resources
    }

    pub(crate) fn markers(&self, resource_id: &str) -> &[Rc<Marker<T>>] {
        self.resources
            .get(resource_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn mint(&mut self, resource_id: &str, data: T) -> Rc<Marker<T>> {
        let sequence = self.sequences.entry(resource_id.to_string()).or_insert(0);
        let id = marker_id(&self.owner, resource_id, *sequence);
        *sequence += 1;
        Rc::new(Marker::new(id, resource_id, &self.owner, &self.kind, data))
    }

    fn replace(&mut self, resource_id: &str, items: Vec<T>) -> usize {
        if items.is_empty() {
            self.resources.remove(resource_id);
            return 0;
        }
        let markers: Vec<_> = items
            .into_iter()
            .map(|data| self.mint(resource_id, data))
            .collect();
        let count = markers.len();
        self.resources.insert(resource_id.to_string(), markers);
        count
    }
}

/// Handle to one owner's markers.
///
/// Created by `MarkerRegistry::create_collection`. The collection stays
/// visible to registry queries until `dispose` is called; dropping the handle
/// without disposing leaves its markers registered.
pub struct MarkerCollection<T> {
    owner: String,
    kind: String,
    state: SharedCollection<T>,
    registry: Weak<RefCell<RegistryState<T>>>,
    notifier: ChangeNotifier,
}

impl<T> MarkerCollection<T> {
    pub(crate) fn new(
        state: SharedCollection<T>,
        registry: Weak<RefCell<RegistryState<T>>>,
        notifier: ChangeNotifier,
    ) -> Self {
        let (owner, kind) = {
            let state = state.borrow();
            (state.owner.clone(), state.kind.clone())
        };
        Self {
            owner,
            kind,
            state,
            registry,
            notifier,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// Replaces every marker on `resource_id` with freshly minted markers.
    ///
    /// An empty `items` removes the resource. Fires exactly one change
    /// notification per call, even when nothing changed.
    ///
    /// Must not be called after `dispose`; debug builds panic, release
    /// builds ignore the call.
    pub fn set_markers(&self, resource_id: &str, items: Vec<T>) {
        if !self.ensure_live("set_markers") {
            return;
        }

        let count = self.state.borrow_mut().replace(resource_id, items);
        debug!(
            "event=markers_set module=registry owner={} kind={} resource={} count={}",
            self.owner, self.kind, resource_id, count
        );
        self.notifier.fire();
    }

    /// Returns this collection's markers for `resource_id` in insertion order.
    pub fn markers(&self, resource_id: &str) -> Vec<Rc<Marker<T>>> {
        if !self.ensure_live("markers") {
            return Vec::new();
        }
        self.state.borrow().markers(resource_id).to_vec()
    }

    /// Returns resource ids currently holding at least one marker.
    pub fn resource_ids(&self) -> Vec<String> {
        if !self.ensure_live("resource_ids") {
            return Vec::new();
        }
        self.state.borrow().resources.keys().cloned().collect()
    }

    /// Removes this collection and all its markers from the registry.
    ///
    /// Idempotent. Fires one change notification when markers were removed.
    pub fn dispose(&self) {
        let had_markers = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            let had_markers = !state.resources.is_empty();
            state.resources.clear();
            had_markers
        };

        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove_if_same(&self.owner, &self.state);
        }
        info!(
            "event=collection_disposed module=registry owner={} kind={}",
            self.owner, self.kind
        );

        if had_markers {
            self.notifier.fire();
        }
    }

    fn ensure_live(&self, operation: &str) -> bool {
        let disposed = self.is_disposed();
        debug_assert!(
            !disposed,
            "{operation} called on disposed marker collection `{}`",
            self.owner
        );
        if disposed {
            warn!(
                "event=disposed_collection_used module=registry owner={} operation={}",
                self.owner, operation
            );
        }
        !disposed
    }
}

impl<T> Debug for MarkerCollection<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerCollection")
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
