//! Event dispatch substrate.
//!
//! A minimal synchronous event target: assignable handler slots plus
//! registered listeners, with optional bubbling to a parent target.
//! Dispatch walks a snapshot of the listener list, so a callback that
//! unregisters itself or tears down its sensor cannot disturb the
//! delivery in flight.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::event::{SensorEvent, SensorEventType, TargetId};

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Callback invoked with each delivered event.
pub type Listener = Rc<dyn Fn(&SensorEvent)>;

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct TargetInner {
    id: TargetId,
    handlers: HashMap<SensorEventType, Listener>,
    listeners: Vec<(ListenerId, SensorEventType, Listener)>,
    parent: Option<EventTarget>,
    next_listener: u64,
}

/// A single-threaded event target; clones share the same listener table.
#[derive(Clone)]
pub struct EventTarget {
    inner: Rc<RefCell<TargetInner>>,
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTarget {
    pub fn new() -> Self {
        let id = TargetId(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Rc::new(RefCell::new(TargetInner {
                id,
                handlers: HashMap::new(),
                listeners: Vec::new(),
                parent: None,
                next_listener: 1,
            })),
        }
    }

    pub fn id(&self) -> TargetId {
        self.inner.borrow().id
    }

    /// Events that bubble continue delivery at `parent`.
    pub fn set_parent(&self, parent: &EventTarget) {
        self.inner.borrow_mut().parent = Some(parent.clone());
    }

    pub fn clear_parent(&self) {
        self.inner.borrow_mut().parent = None;
    }

    /// Installs the assignable handler slot for `event_type`, replacing
    /// any previous handler. Handlers run before registered listeners.
    pub fn set_handler(
        &self,
        event_type: SensorEventType,
        handler: impl Fn(&SensorEvent) + 'static,
    ) {
        self.inner
            .borrow_mut()
            .handlers
            .insert(event_type, Rc::new(handler));
    }

    pub fn clear_handler(&self, event_type: SensorEventType) {
        self.inner.borrow_mut().handlers.remove(&event_type);
    }

    /// Registers a listener; listeners fire in registration order.
    pub fn add_listener(
        &self,
        event_type: SensorEventType,
        listener: impl Fn(&SensorEvent) + 'static,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, event_type, Rc::new(listener)));
        id
    }

    /// Removes a listener; returns false when the id is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        inner.listeners.len() != before
    }

    pub fn listener_count(&self, event_type: SensorEventType) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, ty, _)| *ty == event_type)
            .count()
    }

    /// Synchronously delivers `event` to this target and, when it
    /// bubbles, to the parent chain. Target bookkeeping on the event is
    /// reset once delivery completes.
    pub fn dispatch(&self, event: &mut SensorEvent) {
        self.deliver(event);
        event.clear_dispatch_state();
    }

    fn deliver(&self, event: &mut SensorEvent) {
        let (id, handler, listeners, parent) = {
            let inner = self.inner.borrow();
            let handler = inner.handlers.get(&event.event_type()).cloned();
            let listeners: Vec<Listener> = inner
                .listeners
                .iter()
                .filter(|(_, ty, _)| *ty == event.event_type())
                .map(|(_, _, listener)| listener.clone())
                .collect();
            (inner.id, handler, listeners, inner.parent.clone())
        };

        event.set_current_target(id);
        if event.target().is_none() {
            event.set_target(id);
        }

        if let Some(handler) = handler {
            handler(event);
        }
        for listener in listeners {
            listener(event);
        }

        if event.bubbles() {
            if let Some(parent) = parent {
                parent.deliver(event);
            }
        }
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventTarget")
            .field("id", &inner.id)
            .field("handlers", &inner.handlers.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        log: Rc<RefCell<Vec<&'static str>>>,
        label: &'static str,
    ) -> impl Fn(&SensorEvent) + 'static {
        move |_| log.borrow_mut().push(label)
    }

    #[test]
    fn handler_slot_runs_before_listeners() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        target.add_listener(SensorEventType::Reading, record(log.clone(), "listener"));
        target.set_handler(SensorEventType::Reading, record(log.clone(), "handler"));
        target.dispatch(&mut SensorEvent::new(SensorEventType::Reading, 0.0));
        assert_eq!(*log.borrow(), vec!["handler", "listener"]);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        target.add_listener(SensorEventType::Reading, record(log.clone(), "first"));
        target.add_listener(SensorEventType::Reading, record(log.clone(), "second"));
        target.add_listener(SensorEventType::Activate, record(log.clone(), "other-type"));
        target.dispatch(&mut SensorEvent::new(SensorEventType::Reading, 0.0));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn listener_removing_itself_does_not_skip_others() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<ListenerId>>> = Rc::new(RefCell::new(None));
        let id = {
            let target = target.clone();
            let slot = slot.clone();
            let log = log.clone();
            target.clone().add_listener(SensorEventType::Reading, move |_| {
                log.borrow_mut().push("self-removing");
                if let Some(id) = slot.borrow_mut().take() {
                    target.remove_listener(id);
                }
            })
        };
        *slot.borrow_mut() = Some(id);
        target.add_listener(SensorEventType::Reading, record(log.clone(), "survivor"));

        target.dispatch(&mut SensorEvent::new(SensorEventType::Reading, 0.0));
        assert_eq!(*log.borrow(), vec!["self-removing", "survivor"]);

        log.borrow_mut().clear();
        target.dispatch(&mut SensorEvent::new(SensorEventType::Reading, 1.0));
        assert_eq!(*log.borrow(), vec!["survivor"]);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_event() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let target_handle = target.clone();
            let log = log.clone();
            target.add_listener(SensorEventType::Reading, move |_| {
                log.borrow_mut().push("outer");
                target_handle.add_listener(SensorEventType::Reading, {
                    let log = log.clone();
                    move |_| log.borrow_mut().push("inner")
                });
            });
        }
        target.dispatch(&mut SensorEvent::new(SensorEventType::Reading, 0.0));
        assert_eq!(*log.borrow(), vec!["outer"]);
    }

    #[test]
    fn bubbling_reaches_parent_with_original_target() {
        let parent = EventTarget::new();
        let child = EventTarget::new();
        child.set_parent(&parent);

        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            parent.add_listener(SensorEventType::Error, move |event| {
                seen.borrow_mut()
                    .push((event.target(), event.current_target()));
            });
        }
        {
            let seen = seen.clone();
            child.add_listener(SensorEventType::Error, move |event| {
                seen.borrow_mut()
                    .push((event.target(), event.current_target()));
            });
        }

        let mut event = SensorEvent::bubbling(SensorEventType::Error, 0.0);
        child.dispatch(&mut event);

        let seen = seen.borrow();
        assert_eq!(seen[0], (Some(child.id()), Some(child.id())));
        assert_eq!(seen[1], (Some(child.id()), Some(parent.id())));
        assert_eq!(event.target(), None);
        assert_eq!(event.current_target(), None);
    }

    #[test]
    fn non_bubbling_event_stays_on_child() {
        let parent = EventTarget::new();
        let child = EventTarget::new();
        child.set_parent(&parent);

        let log = Rc::new(RefCell::new(Vec::new()));
        parent.add_listener(SensorEventType::Reading, record(log.clone(), "parent"));
        child.add_listener(SensorEventType::Reading, record(log.clone(), "child"));

        child.dispatch(&mut SensorEvent::new(SensorEventType::Reading, 0.0));
        assert_eq!(*log.borrow(), vec!["child"]);
    }

    #[test]
    fn remove_listener_reports_unknown_ids() {
        let target = EventTarget::new();
        let id = target.add_listener(SensorEventType::Reading, |_| {});
        assert!(target.remove_listener(id));
        assert!(!target.remove_listener(id));
    }

    #[test]
    fn clear_handler_silences_the_slot() {
        let target = EventTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        target.set_handler(SensorEventType::Activate, record(log.clone(), "handler"));
        target.clear_handler(SensorEventType::Activate);
        target.dispatch(&mut SensorEvent::new(SensorEventType::Activate, 0.0));
        assert!(log.borrow().is_empty());
    }
}
