//! Change notification.
//!
//! Collections announce every structural change to their subscribers
//! synchronously, after the change is complete and before the mutating call
//! returns. Dispatch runs over a snapshot of the subscriber list, so a
//! listener may subscribe or cancel while it is being notified.
//!
//! Listener sets are single-threaded (`Rc`-based) and must stay on the
//! thread that owns the collection.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::annotation::AnnotationId;

/// A structural change to a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationsChanged {
    /// An annotation was inserted into the tree.
    Added(AnnotationId),
    /// An annotation and its subtree were removed.
    Removed(AnnotationId),
    /// A group was collapsed or expanded in a view.
    ExpansionChanged(AnnotationId),
}

/// A change callback.
pub type Listener = Rc<dyn Fn(&AnnotationsChanged)>;

#[derive(Default)]
struct ListenerList {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// A set of subscribed listeners.
///
/// Cloning a `Listeners` yields another handle to the same set.
#[derive(Clone, Default)]
pub struct Listeners {
    list: Rc<RefCell<ListenerList>>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is cancelled.
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let mut list = self.list.borrow_mut();
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, listener));
        Subscription {
            id,
            list: Rc::downgrade(&self.list),
        }
    }

    /// Deliver `event` to every listener registered at the time of the call.
    pub fn fire(&self, event: &AnnotationsChanged) {
        let snapshot: Vec<Listener> = self
            .list
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        debug!(?event, listeners = snapshot.len(), "dispatching change");
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.list.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for a registered listener.
#[must_use = "dropping a Subscription keeps the listener registered; call cancel() to detach it"]
pub struct Subscription {
    id: u64,
    list: Weak<RefCell<ListenerList>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    /// Detach the listener. Returns `false` if the listener set no longer
    /// exists or the listener was already gone.
    pub fn cancel(self) -> bool {
        let Some(list) = self.list.upgrade() else {
            return false;
        };
        let mut list = list.borrow_mut();
        let before = list.entries.len();
        list.entries.retain(|(id, _)| *id != self.id);
        list.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<usize>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let listener: Listener = Rc::new(move |_: &AnnotationsChanged| seen.set(seen.get() + 1));
        (count, listener)
    }

    #[test]
    fn fire_reaches_every_listener() {
        let listeners = Listeners::new();
        let (a, la) = counter();
        let (b, lb) = counter();
        let _sa = listeners.subscribe(la);
        let _sb = listeners.subscribe(lb);

        listeners.fire(&AnnotationsChanged::Added(AnnotationId::from_raw(1)));
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn cancel_detaches() {
        let listeners = Listeners::new();
        let (count, listener) = counter();
        let sub = listeners.subscribe(listener);
        assert!(sub.cancel());
        listeners.fire(&AnnotationsChanged::Removed(AnnotationId::from_raw(1)));
        assert_eq!(count.get(), 0);
        assert!(listeners.is_empty());
    }

    #[test]
    fn cancel_after_set_is_dropped() {
        let listeners = Listeners::new();
        let (_, listener) = counter();
        let sub = listeners.subscribe(listener);
        drop(listeners);
        assert!(!sub.cancel());
    }

    #[test]
    fn listener_may_cancel_itself_during_dispatch() {
        let listeners = Listeners::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let inner_slot = Rc::clone(&slot);
        let inner_calls = Rc::clone(&calls);
        let sub = listeners.subscribe(Rc::new(move |_: &AnnotationsChanged| {
            inner_calls.set(inner_calls.get() + 1);
            if let Some(sub) = inner_slot.borrow_mut().take() {
                sub.cancel();
            }
        }));
        *slot.borrow_mut() = Some(sub);

        listeners.fire(&AnnotationsChanged::Added(AnnotationId::from_raw(1)));
        listeners.fire(&AnnotationsChanged::Added(AnnotationId::from_raw(2)));
        assert_eq!(calls.get(), 1);
    }
}
