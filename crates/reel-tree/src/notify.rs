//! Change notification.
//!
//! Every mutation of a [`TreeStore`](crate::TreeStore) produces one
//! [`ChangeEvent`] that is delivered synchronously to each registered
//! [`ChangeObserver`], in registration order, before the mutating call
//! returns. Observers only see the event, never the store, so they cannot
//! re-enter it with another mutation.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use reel_types::{ItemId, StoreId};

/// What happened to the item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The item was attached to `parent` at sibling position `index`.
    Added { index: usize },
    /// The item was detached from `parent`, where it sat at `index`.
    ///
    /// `released` lists the recordings of the removed subtree whose payloads
    /// are no longer referenced by the store.
    Removed { index: usize, released: Vec<ItemId> },
    /// The item was renamed and may have moved among its siblings.
    Renamed {
        old_name: String,
        old_index: usize,
        new_index: usize,
    },
    /// The item moved from folder `from` to `parent` within the same store.
    Moved {
        from: ItemId,
        old_index: usize,
        index: usize,
    },
}

impl ChangeKind {
    /// Short label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Removed { .. } => "removed",
            Self::Renamed { .. } => "renamed",
            Self::Moved { .. } => "moved",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single change to the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The store that changed.
    pub store: StoreId,
    /// The affected item.
    pub item: ItemId,
    /// The folder the item is in after the change (or was in, for removals).
    pub parent: ItemId,
    /// The item's current name.
    pub name: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// The name before a rename, if this is one.
    pub fn old_name(&self) -> Option<&str> {
        match &self.kind {
            ChangeKind::Renamed { old_name, .. } => Some(old_name),
            _ => None,
        }
    }

    /// Recordings released by a removal; empty for other kinds.
    pub fn released(&self) -> &[ItemId] {
        match &self.kind {
            ChangeKind::Removed { released, .. } => released,
            _ => &[],
        }
    }
}

/// Receives change events from a store.
///
/// Implementations run inside the mutating call and should return quickly.
/// Deferring work to another thread is the observer's business.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

impl<F> ChangeObserver for F
where
    F: Fn(&ChangeEvent) + Send + Sync,
{
    fn on_change(&self, event: &ChangeEvent) {
        self(event)
    }
}

/// Handle returned by [`Notifier::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Ordered registry of observers for one store.
#[derive(Default)]
pub struct Notifier {
    observers: Vec<(ObserverId, Box<dyn ChangeObserver>)>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It sees every event emitted after this call.
    pub fn subscribe(&mut self, observer: impl ChangeObserver + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliver an event to every observer, in registration order.
    pub fn emit(&self, event: &ChangeEvent) {
        debug!(
            store = %event.store,
            item = %event.item,
            parent = %event.parent,
            kind = %event.kind,
            observers = self.observers.len(),
            "change emitted"
        );
        for (_, observer) in &self.observers {
            observer.on_change(event);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

/// Observer that records every event it sees.
///
/// Clones share the same buffer, so one clone can be registered with a
/// store while another is kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChangeObserver for EventLog {
    fn on_change(&self, event: &ChangeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn added(store: StoreId) -> ChangeEvent {
        ChangeEvent {
            store,
            item: ItemId::new(),
            parent: ItemId::root(),
            name: "take".into(),
            kind: ChangeKind::Added { index: 0 },
        }
    }

    #[test]
    fn observers_receive_events_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = Notifier::new();
        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            notifier.subscribe(move |_: &ChangeEvent| order.lock().unwrap().push(tag));
        }

        notifier.emit(&added(StoreId::new()));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut notifier = Notifier::new();
        let counter = Arc::clone(&hits);
        let id = notifier.subscribe(move |_: &ChangeEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.emit(&added(StoreId::new()));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.emit(&added(StoreId::new()));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.observer_count(), 0);
    }

    #[test]
    fn event_log_shares_buffer_between_clones() {
        let log = EventLog::new();
        let mut notifier = Notifier::new();
        notifier.subscribe(log.clone());

        let store = StoreId::new();
        notifier.emit(&added(store));
        notifier.emit(&added(store));

        assert_eq!(log.len(), 2);
        assert_eq!(log.drain().len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn old_name_only_for_renames() {
        let mut event = added(StoreId::new());
        assert!(event.old_name().is_none());
        event.kind = ChangeKind::Renamed {
            old_name: "before".into(),
            old_index: 0,
            new_index: 1,
        };
        assert_eq!(event.old_name(), Some("before"));
        assert_eq!(event.kind.to_string(), "renamed");
    }

    #[test]
    fn released_only_for_removals() {
        let rec = ItemId::new();
        let mut event = added(StoreId::new());
        assert!(event.released().is_empty());
        event.kind = ChangeKind::Removed {
            index: 0,
            released: vec![rec],
        };
        assert_eq!(event.released(), &[rec]);
    }
}
