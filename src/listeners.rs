//! Listener registry
//!
//! Listeners are kept in insertion order. Each dispatch pass works on a
//! snapshot, so unsubscribing from inside a listener only affects later passes.

use crate::{trace_log, NavigationEvent};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// What a listener wants to happen after it ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Keep calling the remaining listeners
    #[default]
    Continue,
    /// Skip the remaining listeners for this event only
    Stop,
}

impl From<()> for Propagation {
    fn from((): ()) -> Self {
        Propagation::Continue
    }
}

type Listener = Rc<dyn Fn(&NavigationEvent) -> Propagation>;

/// Identifier of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Slots {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

/// Insertion-ordered set of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    slots: Rc<RefCell<Slots>>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    ///
    /// The callback may return `()` or a [`Propagation`].
    pub fn add<F, R>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&NavigationEvent) -> R + 'static,
        R: Into<Propagation>,
    {
        let listener: Listener =
            Rc::new(move |event: &NavigationEvent| -> Propagation { callback(event).into() });
        let mut slots = self.slots.borrow_mut();
        let id = ListenerId(slots.next_id);
        slots.next_id += 1;
        slots.entries.push((id, listener));
        ListenerHandle {
            id,
            slots: Rc::downgrade(&self.slots),
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.slots.borrow().entries.len()
    }

    /// Check if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().entries.is_empty()
    }

    /// Deliver one event to a snapshot of the registry.
    ///
    /// Returns how many listeners ran.
    pub fn dispatch(&self, event: &NavigationEvent, reverse: bool) -> usize {
        let mut snapshot: Vec<Listener> = self
            .slots
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        if reverse {
            snapshot.reverse();
        }

        let mut called = 0;
        for listener in snapshot {
            called += 1;
            if listener(event) == Propagation::Stop {
                trace_log!("Listener stopped propagation of {:?}", event.action());
                break;
            }
        }
        called
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Returned by `listen`; removes the listener again
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    id: ListenerId,
    slots: Weak<RefCell<Slots>>,
}

impl ListenerHandle {
    /// Identifier of the listener
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener.
    ///
    /// Returns false if it was already removed or the registry is gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(slots) = self.slots.upgrade() else {
            return false;
        };
        let mut slots = slots.borrow_mut();
        let before = slots.entries.len();
        slots.entries.retain(|(id, _)| *id != self.id);
        slots.entries.len() != before
    }
}
