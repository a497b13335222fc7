//! Store Collaborator
//!
//! The scheduler reaches the host store only through the narrow [`Store`]
//! trait: record an event, report the current state and the events
//! dispatched so far. [`RecordingStore`] is a small in-memory
//! implementation that keeps the full event log, optionally folds events
//! into a state value with a reducer, and notifies listeners.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::effect::Event;

/// The contract the scheduler needs from a host store.
pub trait Store {
    /// Accept one event. Called exactly once per dispatch, in dispatch order.
    fn dispatch(&self, event: &Event);

    /// Snapshot of the current state.
    fn state(&self) -> Value;

    /// Every event dispatched so far, oldest first.
    fn dispatched(&self) -> Vec<Event>;
}

/// Identifier returned by [`RecordingStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Reducer = dyn Fn(&Value, &Event) -> Value;
type Listener = Rc<dyn Fn(&Event)>;

/// In-memory store that records every dispatched event.
pub struct RecordingStore {
    events: RefCell<Vec<Event>>,
    state: RefCell<Value>,
    reducer: Option<Box<Reducer>>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: Cell<u64>,
}

impl RecordingStore {
    /// A store with `initial` state that never changes.
    pub fn new(initial: Value) -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            state: RefCell::new(initial),
            reducer: None,
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    /// A store whose state is folded through `reducer` on every dispatch.
    pub fn with_reducer<F>(initial: Value, reducer: F) -> Self
    where
        F: Fn(&Value, &Event) -> Value + 'static,
    {
        Self {
            reducer: Some(Box::new(reducer)),
            ..Self::new(initial)
        }
    }

    /// Call `listener` after every dispatch.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Event) + 'static,
    {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    }

    /// Kinds of the dispatched events, oldest first.
    pub fn kinds(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|event| event.kind().to_string())
            .collect()
    }

    /// Forget the recorded events; state and listeners are kept.
    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl Store for RecordingStore {
    fn dispatch(&self, event: &Event) {
        self.events.borrow_mut().push(event.clone());

        if let Some(reducer) = &self.reducer {
            let next = reducer(&self.state.borrow(), event);
            *self.state.borrow_mut() = next;
        }

        // Listeners may dispatch again; call them on a snapshot.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    fn state(&self) -> Value {
        self.state.borrow().clone()
    }

    fn dispatched(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl fmt::Debug for RecordingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingStore")
            .field("events", &self.events.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .field("state", &self.state.borrow())
            .finish()
    }
}
