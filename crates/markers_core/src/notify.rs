//! Synchronous change notification.
//!
//! # Responsibility
//! - Deliver payload-free "markers changed" signals to subscribers.
//! - Hand out explicit unsubscribe handles.
//!
//! # Invariants
//! - Subscribers run synchronously, in subscription order, on the firing call.
//! - Subscribing or unsubscribing from inside a handler is allowed:
//!   handlers added during a fire are first invoked on the next fire, and a
//!   handler removed during a fire is not invoked for the rest of it.
//! - The notifier never holds an internal borrow while a handler runs.
//! - The fire count advances before the first handler of a fire runs, so
//!   every handler already observes the new count.

use log::trace;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

/// Stable identifier of one subscription within its notifier.
pub type SubscriptionId = u64;

type Handler = Rc<dyn Fn()>;

#[derive(Default)]
struct NotifierState {
    next_id: SubscriptionId,
    fired: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

impl NotifierState {
    fn contains(&self, id: SubscriptionId) -> bool {
        self.handlers.iter().any(|(current, _)| *current == id)
    }

    /// Detaches the handler for `id`. The caller drops it after releasing
    /// the borrow, since a handler may own other subscriptions.
    fn remove(&mut self, id: SubscriptionId) -> Option<Handler> {
        let index = self.handlers.iter().position(|(current, _)| *current == id)?;
        Some(self.handlers.remove(index).1)
    }
}

/// Single-threaded publish/subscribe channel carrying no payload.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    state: Rc<RefCell<NotifierState>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` and returns the handle that keeps it registered.
    ///
    /// Dropping the returned `Subscription` unsubscribes.
    pub fn subscribe(&self, handler: impl Fn() + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.handlers.push((id, Rc::new(handler)));
        trace!("event=subscribe module=notify id={id}");
        Subscription {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    /// Removes one subscription by id. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.state.borrow_mut().remove(id);
        removed.is_some()
    }

    /// Advances the fire count, then invokes every current subscriber once.
    pub fn fire(&self) {
        let (fired, snapshot) = {
            let mut state = self.state.borrow_mut();
            state.fired += 1;
            let snapshot: Vec<(SubscriptionId, Handler)> = state
                .handlers
                .iter()
                .map(|(id, handler)| (*id, Rc::clone(handler)))
                .collect();
            (state.fired, snapshot)
        };
        trace!(
            "event=fire module=notify fired={fired} subscribers={}",
            snapshot.len()
        );

        for (id, handler) in snapshot {
            if !self.state.borrow().contains(id) {
                continue;
            }
            handler();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    /// Number of fires so far, including one currently in progress.
    pub fn fire_count(&self) -> u64 {
        self.state.borrow().fired
    }
}

impl Debug for ChangeNotifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .field("fired", &self.fire_count())
            .finish()
    }
}

/// Registration handle returned by `ChangeNotifier::subscribe`.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: SubscriptionId,
    state: Weak<RefCell<NotifierState>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether the handler is still registered.
    pub fn is_active(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.borrow().contains(self.id))
    }

    /// Unsubscribes explicitly; equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let removed = state.borrow_mut().remove(self.id);
            if removed.is_some() {
                trace!("event=unsubscribe module=notify id={}", self.id);
            }
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
