//! Vector Observable
//!
//! [`Vector`] wraps a `Vec<T>` and reports structural changes through five
//! signals:
//!
//! | Signal            | Payload             | Fires                                  |
//! |-------------------|---------------------|----------------------------------------|
//! | `before_erase`    | `(index, &T) -> bool` | before each element leaves; may veto |
//! | `after_erase`     | `(index, &T)`       | after removal, with the removed value  |
//! | `after_insert`    | `(index, &T)`       | after insertion, per new element       |
//! | `on_change`       | `&Vec<T>`           | once after any mutation                |
//! | `on_value_change` | `(index, &T)`       | an element's own content changed       |
//!
//! # Element handles
//!
//! [`Vector::element`] returns the element's default adapter (a `Value`,
//! nested `Class`, ...) from the vector's reference cache. The adapter is
//! bound to the element rather than to a position: inserting or erasing
//! before it moves the handle along with its element, and erasing the
//! element itself detaches the handle. Mutating a handle reports
//! `on_value_change` with the element's current position, then
//! `on_change`, then the vector's parent.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::mem;
use std::ops::{Range, RangeBounds};
use std::rc::Rc;

use tracing::{debug, trace};

use super::cache::{RefCache, Shared, Slot};
use super::resolve_range;
use crate::error::{ObservableError, Result};
use crate::observable::{Adapter, ElementOwner, Observe, Parent};
use crate::place::{Place, Project};
use crate::signal::{Connection, Signal};

/// An element reached through its cache slot.
struct Tracked(Slot<usize>);

impl<T: 'static> Project<Vec<T>, T> for Tracked {
    fn project<'a>(&self, parent: &'a Vec<T>) -> Option<&'a T> {
        parent.get(self.0.key()?)
    }

    fn project_mut<'a>(&self, parent: &'a mut Vec<T>) -> Option<&'a mut T> {
        parent.get_mut(self.0.key()?)
    }
}

struct VectorCore<T: Observe> {
    place: Place<Vec<T>>,
    parent: Parent,
    cache: RefCache<usize, T::Observer>,
    before_erase: Signal<dyn Fn(usize, &T) -> bool>,
    after_erase: Signal<dyn Fn(usize, &T)>,
    after_insert: Signal<dyn Fn(usize, &T)>,
    on_change: Signal<dyn Fn(&Vec<T>)>,
    on_value_change: Signal<dyn Fn(usize, &T)>,
}

impl<T: Observe> VectorCore<T> {
    fn value_at(&self, index: usize) -> Option<T> {
        self.place.borrow().get(index).cloned()
    }

    /// Ask `before_erase` about every element in `range`.
    fn allow_erase(&self, range: Range<usize>) -> bool {
        if self.before_erase.is_empty() {
            return true;
        }
        for index in range {
            let Some(value) = self.value_at(index) else {
                return false;
            };
            if !self.before_erase.emit_while(|slot| slot(index, &value)) {
                debug!(index, "vector erase vetoed");
                return false;
            }
        }
        true
    }

    fn inserted(&self, range: Range<usize>) {
        let (start, count) = (range.start, range.len());
        self.shift(|&index| Some(if index >= start { index + count } else { index }));
        if self.held_back() {
            return;
        }
        if !self.after_insert.is_empty() {
            for index in range {
                if let Some(value) = self.value_at(index) {
                    self.after_insert.emit(|slot| slot(index, &value));
                }
            }
        }
        self.changed();
    }

    fn erased(&self, start: usize, removed: &[T]) {
        let end = start + removed.len();
        self.shift(|&index| match index {
            i if i < start => Some(i),
            i if i < end => None,
            i => Some(i - removed.len()),
        });
        if self.held_back() {
            return;
        }
        for (offset, value) in removed.iter().enumerate() {
            self.after_erase.emit(|slot| slot(start + offset, value));
        }
        self.changed();
    }

    /// The whole content was replaced.
    fn replaced(&self) {
        let len = self.place.try_borrow().map_or(0, |values| values.len());
        self.shift(|&index| (index < len).then_some(index));
        if self.held_back() {
            return;
        }
        self.changed();
    }

    fn value_changed(&self, index: usize) {
        if self.held_back() {
            return;
        }
        if !self.on_value_change.is_empty() {
            if let Some(value) = self.value_at(index) {
                self.on_value_change.emit(|slot| slot(index, &value));
            }
        }
        self.changed();
    }

    fn changed(&self) {
        trace!("vector changed");
        if !self.on_change.is_empty() {
            if let Some(values) = self.place.snapshot() {
                self.on_change.emit(|slot| slot(&values));
            }
        }
        self.parent.notify();
    }

    fn held_back(&self) -> bool {
        let held = self.parent.is_suppressed();
        if held {
            trace!("vector change held back by transaction");
        }
        held
    }

    /// Move cached handles along with their elements.
    fn shift(&self, remap: impl FnMut(&usize) -> Option<usize>) {
        let detached = self.cache.rekey(remap);
        if detached > 0 {
            debug!(detached, "detached erased vector elements");
        }
    }
}

impl<T: Observe> ElementOwner<Slot<usize>> for VectorCore<T> {
    fn element_changed(&self, slot: &Slot<usize>) {
        if let Some(index) = slot.key() {
            self.value_changed(index);
        }
    }

    fn suppressed(&self) -> bool {
        self.parent.is_suppressed()
    }
}

/// An observable `Vec<T>`.
///
/// # Example
///
/// ```rust
/// use observable_core::container::Vector;
///
/// let names = Vector::new(vec!["abc".to_string(), "def".to_string()]);
/// names.on_before_erase(|_, name| name != "abc");
///
/// assert!(names.erase(0).is_none());
/// assert_eq!(names.len(), 2);
/// assert_eq!(names.erase(1).as_deref(), Some("def"));
/// ```
pub struct Vector<T: Observe> {
    core: Rc<VectorCore<T>>,
}

impl<T: Observe> Vector<T> {
    /// Wrap `values` in a fresh model of their own.
    pub fn new(values: Vec<T>) -> Self {
        Self::bind(Place::new(values), Parent::none())
    }

    /// Observe a model the caller keeps a handle to.
    pub fn from_shared(model: Rc<RefCell<Vec<T>>>) -> Self {
        Self::bind(Place::from_shared(model), Parent::none())
    }

    // ---- Reading ----

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.core.place.borrow().len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.core.place.borrow().is_empty()
    }

    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.core.place.borrow().capacity()
    }

    /// Reserve room for `additional` elements. Not a content change.
    pub fn reserve(&self, additional: usize) {
        self.core.place.borrow_mut().reserve(additional);
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.core.place.borrow(), |values| values.get(index)).ok()
    }

    /// The element at `index`, failing with
    /// [`ObservableError::OutOfRange`].
    pub fn at(&self, index: usize) -> Result<Ref<'_, T>> {
        let len = self.len();
        self.get(index)
            .ok_or(ObservableError::OutOfRange { index, len })
    }

    /// The first element.
    pub fn front(&self) -> Option<Ref<'_, T>> {
        self.get(0)
    }

    /// The last element.
    pub fn back(&self) -> Option<Ref<'_, T>> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    /// The whole vector.
    pub fn model(&self) -> Ref<'_, Vec<T>> {
        self.core.place.borrow()
    }

    // ---- Insertion ----

    /// Append one element.
    pub fn push(&self, value: T) {
        let index = {
            let mut values = self.core.place.borrow_mut();
            values.push(value);
            values.len() - 1
        };
        self.core.inserted(index..index + 1);
    }

    /// Insert `value` before position `index`.
    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        {
            let mut values = self.core.place.borrow_mut();
            let len = values.len();
            if index > len {
                return Err(ObservableError::OutOfRange { index, len });
            }
            values.insert(index, value);
        }
        self.core.inserted(index..index + 1);
        Ok(())
    }

    /// Insert every value of `iter` before position `index`, keeping their
    /// order. Returns how many were inserted.
    pub fn insert_many<I: IntoIterator<Item = T>>(&self, index: usize, iter: I) -> Result<usize> {
        let len = self.len();
        if index > len {
            return Err(ObservableError::OutOfRange { index, len });
        }
        Ok(self.splice_in(index, iter))
    }

    /// Append every value of `iter`. Returns how many were appended.
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) -> usize {
        self.splice_in(self.len(), iter)
    }

    fn splice_in<I: IntoIterator<Item = T>>(&self, index: usize, iter: I) -> usize {
        let count = {
            let mut values = self.core.place.borrow_mut();
            let len = values.len();
            values.splice(index..index, iter);
            values.len() - len
        };
        if count > 0 {
            self.core.inserted(index..index + count);
        }
        count
    }

    // ---- Removal ----

    /// Remove the element at `index`.
    ///
    /// Returns `None` when `index` is out of range or a `before_erase`
    /// subscriber refused.
    pub fn erase(&self, index: usize) -> Option<T> {
        if index >= self.len() || !self.core.allow_erase(index..index + 1) {
            return None;
        }
        let removed = {
            let mut values = self.core.place.borrow_mut();
            (index < values.len()).then(|| values.remove(index))?
        };
        self.core.erased(index, std::slice::from_ref(&removed));
        Some(removed)
    }

    /// Remove every element in `range`.
    ///
    /// Returns `None` when the range is out of bounds or a `before_erase`
    /// subscriber refused any element of it; nothing is removed then.
    pub fn erase_range<R: RangeBounds<usize>>(&self, range: R) -> Option<Vec<T>> {
        let range = resolve_range(range, self.len())?;
        if range.is_empty() {
            return Some(Vec::new());
        }
        if !self.core.allow_erase(range.clone()) {
            return None;
        }
        let start = range.start;
        let removed: Vec<T> = {
            let mut values = self.core.place.borrow_mut();
            if range.end > values.len() {
                return None;
            }
            values.drain(range).collect()
        };
        self.core.erased(start, &removed);
        Some(removed)
    }

    /// Remove the last element.
    pub fn pop(&self) -> Option<T> {
        let last = self.len().checked_sub(1)?;
        self.erase(last)
    }

    /// Remove every element, keeping the allocation. Returns `false` if
    /// vetoed; clearing an empty vector is a silent no-op.
    pub fn clear(&self) -> bool {
        let len = self.len();
        if len == 0 {
            return true;
        }
        if !self.core.allow_erase(0..len) {
            return false;
        }
        let removed: Vec<T> = self.core.place.borrow_mut().drain(..).collect();
        self.core.erased(0, &removed);
        true
    }

    /// Resize to `len`, padding with clones of `value` or truncating.
    ///
    /// Truncation asks `before_erase` first; returns `false` if vetoed.
    pub fn resize(&self, len: usize, value: T) -> bool {
        let old_len = self.len();
        if len < old_len {
            return self.erase_range(len..).is_some();
        }
        if len > old_len {
            self.core.place.borrow_mut().resize(len, value);
            self.core.inserted(old_len..len);
        }
        true
    }

    /// Exchange contents with `other`.
    pub fn swap(&self, other: &mut Vec<T>) {
        mem::swap(&mut *self.core.place.borrow_mut(), other);
        self.core.replaced();
    }

    /// Overwrite the element at `index`; reported as an element change.
    pub fn assign(&self, index: usize, value: T) -> Result<()> {
        {
            let mut values = self.core.place.borrow_mut();
            let len = values.len();
            let slot = values
                .get_mut(index)
                .ok_or(ObservableError::OutOfRange { index, len })?;
            *slot = value;
        }
        self.core.value_changed(index);
        Ok(())
    }

    // ---- Element handles ----

    /// The shared adapter of the element at `index`.
    pub fn element(&self, index: usize) -> Option<Rc<Shared<T::Observer>>> {
        if index >= self.len() {
            return None;
        }
        let core = &self.core;
        Some(core.cache.get_or_create(index, |slot| {
            <T::Observer as Adapter>::bind(
                core.place.project(Tracked(slot.clone())),
                Parent::element(core, slot.clone()),
            )
        }))
    }

    /// Like [`Vector::element`], failing with
    /// [`ObservableError::OutOfRange`].
    pub fn element_at(&self, index: usize) -> Result<Rc<Shared<T::Observer>>> {
        let len = self.len();
        self.element(index)
            .ok_or(ObservableError::OutOfRange { index, len })
    }

    /// The shared adapter of the first element.
    pub fn front_element(&self) -> Option<Rc<Shared<T::Observer>>> {
        self.element(0)
    }

    /// The shared adapter of the last element.
    pub fn back_element(&self) -> Option<Rc<Shared<T::Observer>>> {
        self.len().checked_sub(1).and_then(|last| self.element(last))
    }

    /// The shared adapters of every element, front to back.
    ///
    /// Each item is the same handle [`Vector::element`] returns for that
    /// position.
    pub fn elements(&self) -> impl Iterator<Item = Rc<Shared<T::Observer>>> + '_ {
        (0..self.len()).map_while(move |index| self.element(index))
    }

    /// Number of element adapters currently alive in the cache.
    pub fn cached_elements(&self) -> usize {
        self.core.cache.len()
    }

    // ---- Subscriptions ----

    /// Veto subscription: return `false` to keep the element.
    pub fn on_before_erase<F: Fn(usize, &T) -> bool + 'static>(&self, f: F) -> Connection {
        self.core.before_erase.connect(Rc::new(f))
    }

    /// Called with each removed element and its former position.
    pub fn on_after_erase<F: Fn(usize, &T) + 'static>(&self, f: F) -> Connection {
        self.core.after_erase.connect(Rc::new(f))
    }

    /// Called with each inserted element and its position.
    pub fn on_after_insert<F: Fn(usize, &T) + 'static>(&self, f: F) -> Connection {
        self.core.after_insert.connect(Rc::new(f))
    }

    /// Called once after any mutation.
    pub fn on_change<F: Fn(&Vec<T>) + 'static>(&self, f: F) -> Connection {
        self.core.on_change.connect(Rc::new(f))
    }

    /// Called when an element's own content changed.
    pub fn on_value_change<F: Fn(usize, &T) + 'static>(&self, f: F) -> Connection {
        self.core.on_value_change.connect(Rc::new(f))
    }
}

impl<T: Observe> Adapter for Vector<T> {
    type Model = Vec<T>;

    fn bind(place: Place<Vec<T>>, parent: Parent) -> Self {
        Self {
            core: Rc::new(VectorCore {
                place,
                parent,
                cache: RefCache::new(),
                before_erase: Signal::new(),
                after_erase: Signal::new(),
                after_insert: Signal::new(),
                on_change: Signal::new(),
                on_value_change: Signal::new(),
            }),
        }
    }

    fn place(&self) -> &Place<Vec<T>> {
        &self.core.place
    }

    fn set(&self, values: Vec<T>) {
        *self.core.place.borrow_mut() = values;
        self.core.replaced();
    }

    fn apply<F: FnOnce(&mut Vec<T>)>(&self, f: F) {
        f(&mut *self.core.place.borrow_mut());
        self.core.replaced();
    }

    fn on_change<F: Fn(&Vec<T>) + 'static>(&self, f: F) -> Connection {
        Vector::on_change(self, f)
    }
}

impl<T: Observe + PartialEq> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.model() == *other.model()
    }
}

impl<T: Observe + fmt::Debug> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("values", &self.core.place)
            .field("cached_elements", &self.cached_elements())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
