//! Value Observable
//!
//! A [`Value`] wraps one scalar (or any user type observed as a whole).
//! Reading is free of side effects; `set` and `apply` mutate the model,
//! then emit `on_change` with the new value and notify the parent.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::{Adapter, Parent};
use crate::error::Result;
use crate::place::Place;
use crate::signal::{Connection, Signal};

/// An observable scalar field.
///
/// # Example
///
/// ```rust
/// use observable_core::observable::Value;
///
/// let value = Value::new(0);
/// value.on_change(|v| println!("now {v}"));
/// value.set(10);
/// assert_eq!(*value.get(), 10);
/// ```
pub struct Value<T: 'static> {
    place: Place<T>,
    parent: Parent,
    on_change: Signal<dyn Fn(&T)>,
}

impl<T: Clone + 'static> Value<T> {
    /// Wrap `value` in a fresh model of its own.
    pub fn new(value: T) -> Self {
        Self::bind(Place::new(value), Parent::none())
    }

    /// Observe a model the caller keeps a handle to.
    pub fn from_shared(model: Rc<RefCell<T>>) -> Self {
        Self::bind(Place::from_shared(model), Parent::none())
    }

    /// Read the current value.
    pub fn get(&self) -> Ref<'_, T> {
        self.place.borrow()
    }

    /// Read the current value, failing if the value's element or enum
    /// alternative is gone.
    pub fn try_get(&self) -> Result<Ref<'_, T>> {
        self.place.try_borrow()
    }

    /// Overwrite the value and notify.
    pub fn set(&self, value: T) {
        *self.place.borrow_mut() = value;
        self.changed();
    }

    /// Mutate the value in place and notify.
    pub fn apply<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut *self.place.borrow_mut());
        self.changed();
    }

    /// Subscribe to changes. The callback receives the new value.
    pub fn on_change<F: Fn(&T) + 'static>(&self, f: F) -> Connection {
        self.on_change.connect(Rc::new(f))
    }

    /// Whether the value's fragment of the model still exists.
    pub fn is_attached(&self) -> bool {
        self.place.is_attached()
    }

    /// Identity comparison: whether both wrappers address the fragment
    /// through the same place. `==` compares values instead.
    pub fn same_place(&self, other: &Self) -> bool {
        self.place.ptr_eq(&other.place)
    }

    fn changed(&self) {
        if self.parent.is_suppressed() {
            trace!("value change held back by transaction");
            return;
        }
        if !self.on_change.is_empty() {
            if let Some(value) = self.place.snapshot() {
                self.on_change.emit(|slot| slot(&value));
            }
        }
        self.parent.notify();
    }
}

impl<T: Clone + 'static> Adapter for Value<T> {
    type Model = T;

    fn bind(place: Place<T>, parent: Parent) -> Self {
        Self {
            place,
            parent,
            on_change: Signal::new(),
        }
    }

    fn place(&self) -> &Place<T> {
        &self.place
    }

    fn set(&self, value: T) {
        Value::set(self, value);
    }

    fn apply<F: FnOnce(&mut T)>(&self, f: F) {
        Value::apply(self, f);
    }

    fn on_change<F: Fn(&T) + 'static>(&self, f: F) -> Connection {
        Value::on_change(self, f)
    }
}

/// Two values are equal when their underlying fields are equal.
impl<T: PartialEq + Clone + 'static> PartialEq for Value<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.get() == *other.get()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("value", &self.place)
            .field("subscribers", &self.on_change.slot_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
