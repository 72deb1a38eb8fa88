//! Cross-owner marker registry.
//!
//! # Responsibility
//! - Own the set of live collections keyed by owner.
//! - Answer aggregate queries across collections of one kind.
//! - Be the single point of change notification.
//!
//! # Invariants
//! - At most one live collection per owner; disposed owners may be reused.
//! - Queries snapshot the live collection set before iterating, so handlers
//!   may create or dispose collections at any time.
//! - Collections iterate in owner order, resources in resource id order,
//!   markers in insertion order.

use crate::model::marker::{Marker, MarkerInfo};
use crate::notify::{ChangeNotifier, Subscription};
use crate::registry::collection::{CollectionState, MarkerCollection, SharedCollection};
use log::info;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// Registry-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerRegistryError {
    /// A live collection already exists for this owner.
    DuplicateOwner(String),
}

impl Display for MarkerRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateOwner(owner) => write!(
                f,
                "marker collection for the given owner already exists, owner: {owner}"
            ),
        }
    }
}

impl Error for MarkerRegistryError {}

/// Read-side contract consumed by the tree materializer.
pub trait MarkerSource {
    type Payload;

    /// Per-resource marker counts for `kind`, one entry per resource.
    fn marker_info_by_kind(&self, kind: &str) -> Vec<MarkerInfo>;

    /// Markers of `kind` on `resource_id` across all live collections.
    fn markers_by_resource_and_kind(
        &self,
        resource_id: &str,
        kind: &str,
    ) -> Vec<Rc<Marker<Self::Payload>>>;

    /// Registers a payload-free change handler.
    fn on_markers_changed(&self, handler: impl Fn() + 'static) -> Subscription;

    /// Count of change events so far.
    ///
    /// Advances before any change handler runs, so a reader inside a handler
    /// already sees the new value.
    fn change_generation(&self) -> u64;
}

pub(crate) struct RegistryState<T> {
    collections: BTreeMap<String, SharedCollection<T>>,
}

impl<T> RegistryState<T> {
    /// Removes `owner` only if it still maps to `collection`.
    ///
    /// A stale handle must not remove a newer collection reusing its owner.
    pub(crate) fn remove_if_same(&mut self, owner: &str, collection: &SharedCollection<T>) {
        let same = self
            .collections
            .get(owner)
            .is_some_and(|current| Rc::ptr_eq(current, collection));
        if same {
            self.collections.remove(owner);
        }
    }
}

/// Aggregator of all live marker collections for payload type `T`.
///
/// Cloning yields another handle to the same registry, which is how the
/// process entry point hands it to producers and views.
pub struct MarkerRegistry<T> {
    state: Rc<RefCell<RegistryState<T>>>,
    notifier: ChangeNotifier,
}

impl<T> Clone for MarkerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            notifier: self.notifier.clone(),
        }
    }
}

impl<T> Default for MarkerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MarkerRegistry<T> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState {
                collections: BTreeMap::new(),
            })),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Creates the collection for `owner`, tagged with `kind`.
    ///
    /// # Errors
    /// - `DuplicateOwner` when a live collection for `owner` exists.
    pub fn create_collection(
        &self,
        owner: &str,
        kind: &str,
    ) -> Result<MarkerCollection<T>, MarkerRegistryError> {
        let mut state = self.state.borrow_mut();
        if state.collections.contains_key(owner) {
            return Err(MarkerRegistryError::DuplicateOwner(owner.to_string()));
        }

        let collection = Rc::new(RefCell::new(CollectionState::new(owner, kind)));
        state
            .collections
            .insert(owner.to_string(), Rc::clone(&collection));
        info!("event=collection_created module=registry owner={owner} kind={kind}");

        Ok(MarkerCollection::new(
            collection,
            Rc::downgrade(&self.state),
            self.notifier.clone(),
        ))
    }

    pub fn len(&self) -> usize {
        self.state.borrow().collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().collections.is_empty()
    }

    pub fn contains_owner(&self, owner: &str) -> bool {
        self.state.borrow().collections.contains_key(owner)
    }

    /// Returns sorted owners of live collections.
    pub fn owners(&self) -> Vec<String> {
        self.state.borrow().collections.keys().cloned().collect()
    }

    /// Sums marker counts per resource across live collections of `kind`.
    ///
    /// Entries are sorted by resource id.
    pub fn marker_info_by_kind(&self, kind: &str) -> Vec<MarkerInfo> {
        let mut counts = BTreeMap::<String, usize>::new();
        for collection in self.snapshot(Some(kind)) {
            let collection = collection.borrow();
            for (resource_id, markers) in collection.resources() {
                *counts.entry(resource_id.clone()).or_insert(0) += markers.len();
            }
        }
        counts
            .into_iter()
            .map(|(resource_id, count)| MarkerInfo { resource_id, count })
            .collect()
    }

    /// Concatenates markers on `resource_id` across live collections of `kind`.
    pub fn markers_by_resource_and_kind(
        &self,
        resource_id: &str,
        kind: &str,
    ) -> Vec<Rc<Marker<T>>> {
        self.snapshot(Some(kind))
            .iter()
            .flat_map(|collection| collection.borrow().markers(resource_id).to_vec())
            .collect()
    }

    /// Returns sorted resource ids carrying at least one marker of `kind`.
    pub fn resource_ids_by_kind(&self, kind: &str) -> Vec<String> {
        self.marker_info_by_kind(kind)
            .into_iter()
            .map(|info| info.resource_id)
            .collect()
    }

    /// Visits every live marker.
    ///
    /// Markers are collected before `visit` runs, so `visit` may mutate the
    /// registry.
    pub fn for_each_marker(&self, visit: impl FnMut(&Rc<Marker<T>>)) {
        self.collect_markers(None).iter().for_each(visit);
    }

    /// Visits every live marker of `kind`.
    pub fn for_each_marker_by_kind(&self, kind: &str, visit: impl FnMut(&Rc<Marker<T>>)) {
        self.collect_markers(Some(kind)).iter().for_each(visit);
    }

    /// Registers a handler fired after every `set_markers` on any collection.
    pub fn on_markers_changed(&self, handler: impl Fn() + 'static) -> Subscription {
        self.notifier.subscribe(handler)
    }

    pub fn change_subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    /// Count of change events fired so far.
    pub fn change_generation(&self) -> u64 {
        self.notifier.fire_count()
    }

    fn snapshot(&self, kind: Option<&str>) -> Vec<SharedCollection<T>> {
        self.state
            .borrow()
            .collections
            .values()
            .filter(|collection| kind.map_or(true, |kind| collection.borrow().kind() == kind))
            .cloned()
            .collect()
    }

    fn collect_markers(&self, kind: Option<&str>) -> Vec<Rc<Marker<T>>> {
        let mut markers = Vec::new();
        for collection in self.snapshot(kind) {
            let collection = collection.borrow();
            for resource_markers in collection.resources().values() {
                markers.extend(resource_markers.iter().cloned());
            }
        }
        markers
    }
}

impl<T> MarkerSource for MarkerRegistry<T> {
    type Payload = T;

    fn marker_info_by_kind(&self, kind: &str) -> Vec<MarkerInfo> {
        MarkerRegistry::marker_info_by_kind(self, kind)
    }

    fn markers_by_resource_and_kind(&self, resource_id: &str, kind: &str) -> Vec<Rc<Marker<T>>> {
        MarkerRegistry::markers_by_resource_and_kind(self, resource_id, kind)
    }

    fn on_markers_changed(&self, handler: impl Fn() + 'static) -> Subscription {
        MarkerRegistry::on_markers_changed(self, handler)
    }

    fn change_generation(&self) -> u64 {
        MarkerRegistry::change_generation(self)
    }
}

impl<T> Debug for MarkerRegistry<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerRegistry")
            .field("owners", &self.owners())
            .field("notifier", &self.notifier)
            .finish()
    }
}
