//! Model Addressing
//!
//! Observables never own the data they observe. The model lives in a shared
//! cell (`Rc<RefCell<M>>`) and every wrapper reaches its own fragment through
//! a [`Place`]: the root cell plus a chain of [`Project`]ions.
//!
//! # Projection chains
//!
//! A nested member such as `root.inner.items[3].name` is addressed by
//! composing four projections. Each level of the observable tree adds one
//! projection to its parent's place when it binds a child, so the tree of
//! places mirrors the tree of adapters.
//!
//! # Borrowing
//!
//! `borrow()` and `borrow_mut()` hand out `Ref`/`RefMut` guards of the root
//! cell mapped down to the fragment. Holding a guard while mutating the same
//! model through another wrapper panics, exactly like any `RefCell`.
//! Adapters never hold a guard while their subscribers run: payloads are
//! [`Place::snapshot`]s.

mod projection;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{ObservableError, Result};

pub use projection::{Arm, Field, Index, Project};

/// Resolve a fragment of a root cell.
trait Access<T> {
    fn borrow(&self) -> Option<Ref<'_, T>>;
    fn borrow_mut(&self) -> Option<RefMut<'_, T>>;
}

/// The root cell itself.
struct Root<T>(Rc<RefCell<T>>);

impl<T> Access<T> for Root<T> {
    fn borrow(&self) -> Option<Ref<'_, T>> {
        Some(self.0.borrow())
    }

    fn borrow_mut(&self) -> Option<RefMut<'_, T>> {
        Some(self.0.borrow_mut())
    }
}

/// A parent place narrowed by one projection.
struct Projected<P: 'static, T, J> {
    parent: Place<P>,
    projection: J,
    _marker: PhantomData<fn() -> T>,
}

impl<P: 'static, T: 'static, J: Project<P, T>> Access<T> for Projected<P, T, J> {
    fn borrow(&self) -> Option<Ref<'_, T>> {
        let parent = self.parent.access.borrow()?;
        Ref::filter_map(parent, |p| self.projection.project(p)).ok()
    }

    fn borrow_mut(&self) -> Option<RefMut<'_, T>> {
        let parent = self.parent.access.borrow_mut()?;
        RefMut::filter_map(parent, |p| self.projection.project_mut(p)).ok()
    }
}

/// Shared accessor to a `T` stored somewhere inside a model.
///
/// Cloning a place is cheap and yields an accessor to the same fragment.
pub struct Place<T: 'static> {
    access: Rc<dyn Access<T>>,
}

impl<T: 'static> Place<T> {
    /// Move `value` into a fresh root cell.
    pub fn new(value: T) -> Self {
        Self::from_shared(Rc::new(RefCell::new(value)))
    }

    /// Address an existing root cell.
    pub fn from_shared(model: Rc<RefCell<T>>) -> Self {
        Self {
            access: Rc::new(Root(model)),
        }
    }

    /// Narrow this place by one projection.
    pub fn project<U: 'static, J: Project<T, U>>(&self, projection: J) -> Place<U> {
        Place {
            access: Rc::new(Projected {
                parent: self.clone(),
                projection,
                _marker: PhantomData,
            }),
        }
    }

    /// Shared access to the fragment.
    ///
    /// # Panics
    ///
    /// Panics if the place is detached (see [`Place::try_borrow`]) or if the
    /// model is currently borrowed mutably.
    pub fn borrow(&self) -> Ref<'_, T> {
        match self.access.borrow() {
            Some(fragment) => fragment,
            None => panic!("{}", ObservableError::Detached),
        }
    }

    /// Exclusive access to the fragment.
    ///
    /// # Panics
    ///
    /// Panics if the place is detached or if the model is currently
    /// borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        match self.access.borrow_mut() {
            Some(fragment) => fragment,
            None => panic!("{}", ObservableError::Detached),
        }
    }

    /// Shared access, failing with [`ObservableError::Detached`] when the
    /// projection chain no longer resolves (erased element, inactive enum
    /// alternative).
    pub fn try_borrow(&self) -> Result<Ref<'_, T>> {
        self.access.borrow().ok_or(ObservableError::Detached)
    }

    /// A copy of the fragment, or `None` if the place is detached.
    ///
    /// The model is no longer borrowed when this returns, so subscribers
    /// handed a snapshot are free to mutate it.
    pub fn snapshot(&self) -> Option<T>
    where
        T: Clone,
    {
        self.access.borrow().map(|fragment| T::clone(&fragment))
    }

    /// Whether every projection up to the root still resolves.
    pub fn is_attached(&self) -> bool {
        self.access.borrow().is_some()
    }

    /// Whether both places are clones of the same accessor.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.access, &other.access)
    }
}

impl<T: 'static> Clone for Place<T> {
    fn clone(&self) -> Self {
        Self {
            access: Rc::clone(&self.access),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Place<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access.borrow() {
            Some(fragment) => f.debug_tuple("Place").field(&*fragment).finish(),
            None => f.write_str("Place(<detached>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Inner {
        values: Vec<i32>,
    }

    #[derive(Debug, Default)]
    struct Outer {
        name: String,
        inner: Inner,
    }

    fn inner_values(outer: &Place<Outer>) -> Place<Vec<i32>> {
        outer
            .project(Field::new(|o: &Outer| &o.inner, |o: &mut Outer| &mut o.inner))
            .project(Field::new(|i: &Inner| &i.values, |i: &mut Inner| &mut i.values))
    }

    #[test]
    fn root_place_reads_and_writes() {
        let place = Place::new(5);
        *place.borrow_mut() += 1;
        assert_eq!(*place.borrow(), 6);
    }

    #[test]
    fn shared_root_is_visible_to_the_owner() {
        let model = Rc::new(RefCell::new(Outer::default()));
        let place = Place::from_shared(Rc::clone(&model));
        let name = place.project(Field::new(|o: &Outer| &o.name, |o: &mut Outer| &mut o.name));

        name.borrow_mut().push_str("root");
        assert_eq!(model.borrow().name, "root");
    }

    #[test]
    fn nested_projection_reaches_deep_fragment() {
        let outer = Place::new(Outer::default());
        let values = inner_values(&outer);
        values.borrow_mut().push(3);

        let second = values.project(Index(0));
        *second.borrow_mut() = 9;
        assert_eq!(outer.borrow().inner.values, vec![9]);
    }

    #[test]
    fn erased_element_detaches_its_place() {
        let values = Place::new(vec![1, 2]);
        let last = values.project(Index(1));
        assert!(last.is_attached());

        values.borrow_mut().pop();
        assert!(!last.is_attached());
        assert!(matches!(last.try_borrow(), Err(ObservableError::Detached)));
    }

    #[test]
    fn clones_share_identity() {
        let place = Place::new(1);
        let clone = place.clone();
        let other = Place::new(1);

        assert!(place.ptr_eq(&clone));
        assert!(!place.ptr_eq(&other));
    }

    #[test]
    fn snapshot_releases_the_model() {
        let values = Place::new(vec![1, 2]);
        let first = values.project(Index(0));

        let copy = first.snapshot();
        *values.borrow_mut() = Vec::new();

        assert_eq!(copy, Some(1));
        assert_eq!(first.snapshot(), None);
    }

    #[test]
    #[should_panic(expected = "detached")]
    fn borrowing_a_detached_place_panics() {
        let values: Place<Vec<i32>> = Place::new(Vec::new());
        let _ = values.project(Index(0)).borrow();
    }
}
