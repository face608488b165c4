//! Signal Implementation
//!
//! A [`Signal`] is an ordered list of subscribers sharing one callback type.
//! The callback type is a trait object (`dyn Fn(&T)`,
//! `dyn Fn(usize, &T) -> bool`, ...) so one signal type serves plain
//! change notifications, keyed element notifications and erase vetoes.
//!
//! # Emission
//!
//! Emission walks a snapshot of the subscriber list taken before the first
//! call. A subscriber may connect or disconnect others (or itself) while the
//! signal is emitting:
//!
//! - subscribers connected during emission are first called on the next
//!   emission
//! - subscribers disconnected during emission are skipped if they have not
//!   run yet

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::trace;

use super::connection::{Connection, SlotId, SlotTable};

type Slots<F> = RefCell<IndexMap<SlotId, Rc<F>>>;

impl<F: ?Sized> SlotTable for Slots<F> {
    fn remove_slot(&self, id: SlotId) -> bool {
        self.borrow_mut().shift_remove(&id).is_some()
    }

    fn has_slot(&self, id: SlotId) -> bool {
        self.borrow().contains_key(&id)
    }
}

/// A multi-subscriber broadcaster.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use observable_core::signal::Signal;
///
/// let signal: Signal<dyn Fn(&i32)> = Signal::new();
/// let connection = signal.connect(Rc::new(|value: &i32| println!("got {value}")));
///
/// signal.emit(|slot| slot(&5));
/// connection.disconnect();
/// ```
pub struct Signal<F: ?Sized + 'static> {
    slots: Rc<Slots<F>>,
}

impl<F: ?Sized + 'static> Signal<F> {
    /// Create a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// Append a subscriber.
    pub fn connect(&self, slot: Rc<F>) -> Connection {
        let id = SlotId::new();
        self.slots.borrow_mut().insert(id, slot);

        let slots: Weak<Slots<F>> = Rc::downgrade(&self.slots);
        let table: Weak<dyn SlotTable> = slots;
        Connection::new(id, table)
    }

    /// Invoke every live subscriber in subscription order.
    pub fn emit(&self, mut invoke: impl FnMut(&F)) {
        for (id, slot) in self.snapshot() {
            if self.slots.borrow().contains_key(&id) {
                invoke(&*slot);
            }
        }
    }

    /// Invoke subscribers in order until one returns `false`.
    ///
    /// Returns `true` when every subscriber agreed (or there were none).
    pub fn emit_while(&self, mut invoke: impl FnMut(&F) -> bool) -> bool {
        for (id, slot) in self.snapshot() {
            if !self.slots.borrow().contains_key(&id) {
                continue;
            }
            if !invoke(&*slot) {
                trace!(slot = id.raw(), "subscriber refused");
                return false;
            }
        }
        true
    }

    /// Number of registered subscribers.
    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Remove every subscriber.
    pub fn disconnect_all(&self) {
        self.slots.borrow_mut().clear();
    }

    fn snapshot(&self) -> SmallVec<[(SlotId, Rc<F>); 4]> {
        self.slots
            .borrow()
            .iter()
            .map(|(id, slot)| (*id, Rc::clone(slot)))
            .collect()
    }
}

impl<F: ?Sized + 'static> Default for Signal<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized + 'static> fmt::Debug for Signal<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slot_count", &self.slot_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
