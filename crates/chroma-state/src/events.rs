//! Publish/subscribe event bus for model change notification.
//!
//! UI observers subscribe with an optional predicate; `publish` walks
//! matching subscriptions in registration order, which is what keeps menu
//! updates and list repaints deterministic.

use chroma_config::{Field, ItemKind};

/// A model change event produced toward the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Every derived list is about to be invalidated (config swap underway).
    ResetBegan,
    /// The config swap finished; models may re-query.
    ResetEnded,
    /// One field of one item changed.
    CellChanged {
        /// Item kind.
        kind: ItemKind,
        /// Item name.
        name: String,
        /// Changed field.
        field: Field,
    },
    /// An item was added.
    ItemAdded {
        /// Item kind.
        kind: ItemKind,
        /// New item name.
        name: String,
    },
    /// An item was removed.
    ItemRemoved {
        /// Item kind.
        kind: ItemKind,
        /// Removed item name.
        name: String,
    },
    /// An item changed row within its kind.
    ItemMoved {
        /// Item kind.
        kind: ItemKind,
        /// Moved item name.
        name: String,
    },
    /// An item was renamed.
    ItemRenamed {
        /// Item kind.
        kind: ItemKind,
        /// Previous name.
        old: String,
        /// New name.
        new: String,
    },
    /// The editor wants the UI to select an item (post-undo reselection).
    SelectionRequested {
        /// Item kind.
        kind: ItemKind,
        /// Item to select.
        name: String,
    },
    /// Human-readable warning for the user.
    Warning {
        /// Warning text.
        message: String,
    },
}

/// Handle for one bus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Predicate = Box<dyn Fn(&Event) -> bool>;
type Callback = Box<dyn FnMut(&Event)>;

/// Ordered publish/subscribe bus.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriberId, Option<Predicate>, Callback)>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event.
    pub fn subscribe(&mut self, callback: impl FnMut(&Event) + 'static) -> SubscriberId {
        self.subscribe_inner(None, Box::new(callback))
    }

    /// Subscribe to events matching a predicate.
    pub fn subscribe_filtered(
        &mut self,
        predicate: impl Fn(&Event) -> bool + 'static,
        callback: impl FnMut(&Event) + 'static,
    ) -> SubscriberId {
        self.subscribe_inner(Some(Box::new(predicate)), Box::new(callback))
    }

    /// Drop a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _, _)| *sid != id);
    }

    /// Deliver an event to matching subscribers in registration order.
    pub fn publish(&mut self, event: &Event) {
        for (_, predicate, callback) in &mut self.subscribers {
            if predicate.as_ref().is_none_or(|p| p(event)) {
                callback(event);
            }
        }
    }

    fn subscribe_inner(&mut self, predicate: Option<Predicate>, callback: Callback) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, predicate, callback));
        id
    }
}
