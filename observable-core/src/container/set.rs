//! Set Observable
//!
//! [`UnorderedSet`] wraps a `HashSet<T>`. Set elements are immutable, so
//! there is no element cache and no `on_value_change`: only the structural
//! signals and `on_change`.

use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::mem;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::observable::{Adapter, Parent};
use crate::place::Place;
use crate::signal::{Connection, Signal};

/// An observable `HashSet<T>`.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use observable_core::container::UnorderedSet;
///
/// let tags = UnorderedSet::new(HashSet::new());
/// tags.on_after_insert(|tag: &String| println!("tagged {tag}"));
///
/// assert!(tags.insert("draft".to_string()));
/// assert!(!tags.insert("draft".to_string()));
/// assert!(tags.erase(&"draft".to_string()));
/// ```
pub struct UnorderedSet<T: Hash + Eq + 'static> {
    place: Place<HashSet<T>>,
    parent: Parent,
    before_erase: Signal<dyn Fn(&T) -> bool>,
    after_erase: Signal<dyn Fn(&T)>,
    after_insert: Signal<dyn Fn(&T)>,
    on_change: Signal<dyn Fn(&HashSet<T>)>,
}

impl<T: Hash + Eq + Clone + 'static> UnorderedSet<T> {
    /// Wrap `values` in a fresh model of their own.
    pub fn new(values: HashSet<T>) -> Self {
        Self::bind(Place::new(values), Parent::none())
    }

    /// Observe a model the caller keeps a handle to.
    pub fn from_shared(model: Rc<RefCell<HashSet<T>>>) -> Self {
        Self::bind(Place::from_shared(model), Parent::none())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.place.borrow().len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.place.borrow().is_empty()
    }

    /// Whether `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.place.borrow().contains(value)
    }

    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.place.borrow().capacity()
    }

    /// Reserve room for `additional` elements. Not a content change.
    pub fn reserve(&self, additional: usize) {
        self.place.borrow_mut().reserve(additional);
    }

    /// The whole set.
    pub fn model(&self) -> Ref<'_, HashSet<T>> {
        self.place.borrow()
    }

    /// Insert `value`. Returns `false` if it was already present.
    pub fn insert(&self, value: T) -> bool {
        if !self.place.borrow_mut().insert(value.clone()) {
            return false;
        }
        self.inserted(std::slice::from_ref(&value));
        true
    }

    /// Insert every value of `iter`. Returns how many were new; `on_change`
    /// fires once.
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) -> usize {
        let inserted: Vec<T> = {
            let mut set = self.place.borrow_mut();
            iter.into_iter()
                .filter(|value| set.insert(value.clone()))
                .collect()
        };
        if !inserted.is_empty() {
            self.inserted(&inserted);
        }
        inserted.len()
    }

    /// Remove `value`. Returns `false` if it was absent or the erase was
    /// vetoed.
    pub fn erase(&self, value: &T) -> bool {
        if !self.contains(value) || !self.allow_erase(std::slice::from_ref(value)) {
            return false;
        }
        let removed = self.place.borrow_mut().take(value);
        match removed {
            Some(removed) => {
                self.erased(std::slice::from_ref(&removed));
                true
            }
            None => false,
        }
    }

    /// Remove every element, keeping the set's allocation. Returns `false`
    /// if vetoed; clearing an empty set is a silent no-op.
    pub fn clear(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let values: Vec<T> = self.place.borrow().iter().cloned().collect();
        if !self.allow_erase(&values) {
            return false;
        }
        let removed: Vec<T> = self.place.borrow_mut().drain().collect();
        self.erased(&removed);
        true
    }

    /// Exchange contents with `other`.
    pub fn swap(&self, other: &mut HashSet<T>) {
        mem::swap(&mut *self.place.borrow_mut(), other);
        if !self.held_back() {
            self.changed();
        }
    }

    /// Veto subscription: return `false` to keep the element.
    pub fn on_before_erase<F: Fn(&T) -> bool + 'static>(&self, f: F) -> Connection {
        self.before_erase.connect(Rc::new(f))
    }

    /// Called with each removed element.
    pub fn on_after_erase<F: Fn(&T) + 'static>(&self, f: F) -> Connection {
        self.after_erase.connect(Rc::new(f))
    }

    /// Called with each inserted element.
    pub fn on_after_insert<F: Fn(&T) + 'static>(&self, f: F) -> Connection {
        self.after_insert.connect(Rc::new(f))
    }

    /// Called once after any mutation.
    pub fn on_change<F: Fn(&HashSet<T>) + 'static>(&self, f: F) -> Connection {
        self.on_change.connect(Rc::new(f))
    }

    fn allow_erase(&self, values: &[T]) -> bool {
        for value in values {
            if !self.before_erase.emit_while(|slot| slot(value)) {
                debug!("set erase vetoed");
                return false;
            }
        }
        true
    }

    fn inserted(&self, values: &[T]) {
        if self.held_back() {
            return;
        }
        for value in values {
            self.after_insert.emit(|slot| slot(value));
        }
        self.changed();
    }

    fn erased(&self, values: &[T]) {
        if self.held_back() {
            return;
        }
        for value in values {
            self.after_erase.emit(|slot| slot(value));
        }
        self.changed();
    }

    fn changed(&self) {
        trace!("set changed");
        if !self.on_change.is_empty() {
            if let Some(set) = self.place.snapshot() {
                self.on_change.emit(|slot| slot(&set));
            }
        }
        self.parent.notify();
    }

    fn held_back(&self) -> bool {
        let held = self.parent.is_suppressed();
        if held {
            trace!("set change held back by transaction");
        }
        held
    }
}

impl<T: Hash + Eq + Clone + 'static> Adapter for UnorderedSet<T> {
    type Model = HashSet<T>;

    fn bind(place: Place<HashSet<T>>, parent: Parent) -> Self {
        Self {
            place,
            parent,
            before_erase: Signal::new(),
            after_erase: Signal::new(),
            after_insert: Signal::new(),
            on_change: Signal::new(),
        }
    }

    fn place(&self) -> &Place<HashSet<T>> {
        &self.place
    }

    fn set(&self, values: HashSet<T>) {
        *self.place.borrow_mut() = values;
        if !self.held_back() {
            self.changed();
        }
    }

    fn apply<F: FnOnce(&mut HashSet<T>)>(&self, f: F) {
        f(&mut *self.place.borrow_mut());
        if !self.held_back() {
            self.changed();
        }
    }

    fn on_change<F: Fn(&HashSet<T>) + 'static>(&self, f: F) -> Connection {
        UnorderedSet::on_change(self, f)
    }
}

impl<T: Hash + Eq + 'static> PartialEq for UnorderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.place.borrow() == *other.place.borrow()
    }
}

impl<T: Hash + Eq + fmt::Debug + 'static> fmt::Debug for UnorderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnorderedSet")
            .field("values", &self.place)
            .finish()
    }
}
