//! Synchronous change notification.
//!
//! [`EventSource`] keeps an ordered list of listener callbacks and invokes them
//! in place, on the caller's thread, whenever the owner emits an event. Owners
//! emit only after their own state has been fully updated, so listeners always
//! observe a consistent post-state.
//!
//! Registration goes through a shared reference: read-only views hand out
//! subscriptions on their owner's source without being able to mutate the owner.
//! The type is deliberately neither `Send` nor `Sync`.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// Handle returned by [`EventSource::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

pub struct EventSource<T> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<T>)>>,
}

impl<T> EventSource<T> {
    pub fn new() -> EventSource<T> {
        EventSource {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Registers `listener` and returns its subscription handle.
    ///
    /// A listener registered while an event is being delivered starts receiving
    /// events with the next emitted one.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let listener: Listener<T> = Rc::new(RefCell::new(listener));
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Removes the listener registered under `id`.
    ///
    /// Returns `false` if no such listener is registered. A listener removed
    /// during delivery is not invoked for the remainder of that event.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|(lid, _)| *lid == id) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.borrow().is_empty()
    }

    /// Delivers `event` to every registered listener in subscription order.
    ///
    /// A listener that re-entrantly triggers another emit on the same source is
    /// not invoked recursively; the nested event reaches the remaining listeners.
    pub fn emit(&self, event: &T) {
        if !self.has_listeners() {
            return;
        }
        let snapshot = self.listeners.borrow().clone();
        for (id, listener) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (*listener)(event);
            } else {
                log::trace!("skipping re-entrant delivery to listener {id:?}");
            }
        }
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl<T> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::EventSource;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (log.clone(), log)
    }

    #[test]
    fn test_emit_in_subscription_order() {
        let source = EventSource::<u32>::new();
        let (log, handle) = recorder();
        let l1 = handle.clone();
        source.subscribe(move |e| l1.borrow_mut().push(format!("a{e}")));
        let l2 = handle.clone();
        source.subscribe(move |e| l2.borrow_mut().push(format!("b{e}")));

        source.emit(&1);
        source.emit(&2);
        assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_unsubscribe() {
        let source = EventSource::<u32>::new();
        let (log, handle) = recorder();
        let id = source.subscribe(move |e| handle.borrow_mut().push(e.to_string()));
        assert_eq!(source.listener_count(), 1);
        source.emit(&7);
        assert!(source.unsubscribe(id));
        assert!(!source.unsubscribe(id));
        source.emit(&8);
        assert_eq!(*log.borrow(), vec!["7"]);
        assert!(!source.has_listeners());
    }

    #[test]
    fn test_subscribe_during_delivery() {
        let source = Rc::new(EventSource::<u32>::new());
        let (log, handle) = recorder();

        let inner_source = source.clone();
        let inner_log = handle.clone();
        let subscribed = Rc::new(RefCell::new(false));
        source.subscribe(move |e| {
            handle.borrow_mut().push(format!("outer{e}"));
            if !*subscribed.borrow() {
                *subscribed.borrow_mut() = true;
                let late_log = inner_log.clone();
                inner_source.subscribe(move |e| late_log.borrow_mut().push(format!("late{e}")));
            }
        });

        source.emit(&1);
        source.emit(&2);
        assert_eq!(*log.borrow(), vec!["outer1", "outer2", "late2"]);
    }

    #[test]
    fn test_unsubscribe_during_delivery() {
        let source = Rc::new(EventSource::<u32>::new());
        let (log, handle) = recorder();

        let victim_log = handle.clone();
        let victim = Rc::new(RefCell::new(None));

        let killer_source = source.clone();
        let killer_victim = victim.clone();
        source.subscribe(move |_| {
            if let Some(id) = killer_victim.borrow_mut().take() {
                killer_source.unsubscribe(id);
            }
        });
        let id = source.subscribe(move |e| victim_log.borrow_mut().push(e.to_string()));
        *victim.borrow_mut() = Some(id);

        source.emit(&1);
        assert!(log.borrow().is_empty());
        assert_eq!(source.listener_count(), 1);
    }

    #[test]
    fn test_reentrant_emit_is_not_recursive() {
        let source = Rc::new(EventSource::<u32>::new());
        let (log, handle) = recorder();
        let nested = source.clone();
        source.subscribe(move |e| {
            handle.borrow_mut().push(e.to_string());
            if *e == 1 {
                nested.emit(&2);
            }
        });
        source.emit(&1);
        assert_eq!(*log.borrow(), vec!["1"]);
    }
}
