//! Class Combinator
//!
//! A [`Class`] composes the members of a struct into one observable. Each
//! member gets its own adapter, bound to its field and linked back to the
//! class, so any member mutation (however deeply nested) ends in the
//! class's aggregate `on_change` with the whole model as payload.
//!
//! # Declaring a class
//!
//! A model opts in by implementing [`ClassModel`] (how to bind the
//! members) and one [`Member<Tag>`] per field (which member a tag selects):
//!
//! ```rust
//! use observable_core::observable::{Binder, Class, ClassModel, Member, Observe, Value};
//!
//! #[derive(Clone, Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! struct X;
//! struct Y;
//!
//! struct PointMembers {
//!     x: Value<i32>,
//!     y: Value<i32>,
//! }
//!
//! impl ClassModel for Point {
//!     type Members = PointMembers;
//!
//!     fn bind_members(b: &Binder<Self>) -> PointMembers {
//!         PointMembers {
//!             x: b.field(|p| &p.x, |p| &mut p.x),
//!             y: b.field(|p| &p.y, |p| &mut p.y),
//!         }
//!     }
//! }
//!
//! impl Member<X> for Point {
//!     type Adapter = Value<i32>;
//!     fn member(m: &PointMembers) -> &Value<i32> { &m.x }
//! }
//!
//! impl Member<Y> for Point {
//!     type Adapter = Value<i32>;
//!     fn member(m: &PointMembers) -> &Value<i32> { &m.y }
//! }
//!
//! impl Observe for Point {
//!     type Observer = Class<Point>;
//! }
//!
//! let point = Class::new(Point::default());
//! point.on_change(|p| println!("({}, {})", p.x, p.y));
//! point.set::<X>(3);
//! assert_eq!(point.model().x, 3);
//! ```

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::parent::Propagate;
use super::transaction::Transaction;
use super::{Adapter, Observe, Parent};
use crate::error::Result;
use crate::place::{Arm, Field, Place};
use crate::signal::{Connection, Signal};

/// A struct that can be observed member by member.
pub trait ClassModel: Clone + 'static {
    /// The adapters of all members, usually a plain struct.
    type Members: 'static;

    /// Bind one adapter per member.
    fn bind_members(binder: &Binder<Self>) -> Self::Members;
}

/// Selects one member of a [`ClassModel`] by tag.
///
/// `Tag` is a zero-sized marker type that is never instantiated.
pub trait Member<Tag>: ClassModel {
    /// The selected member's adapter.
    type Adapter: Adapter;

    /// Pick the member out of the bound members.
    fn member(members: &Self::Members) -> &Self::Adapter;
}

/// Binds member adapters to the parts of a model.
///
/// Handed to [`ClassModel::bind_members`] and
/// [`VariantModel::observe_active`](super::VariantModel::observe_active);
/// every adapter it creates reports to the adapter being bound.
pub struct Binder<M: 'static> {
    place: Place<M>,
    parent: Parent,
}

impl<M: 'static> Binder<M> {
    pub(crate) fn new(place: Place<M>, parent: Parent) -> Self {
        Self { place, parent }
    }

    /// Bind the default adapter of a field.
    pub fn field<T: Observe>(&self, get: fn(&M) -> &T, get_mut: fn(&mut M) -> &mut T) -> T::Observer {
        self.field_as::<T::Observer>(get, get_mut)
    }

    /// Bind a chosen adapter kind to a field.
    pub fn field_as<A: Adapter>(
        &self,
        get: fn(&M) -> &A::Model,
        get_mut: fn(&mut M) -> &mut A::Model,
    ) -> A {
        A::bind(self.place.project(Field::new(get, get_mut)), self.parent.clone())
    }

    /// Bind the default adapter of an enum alternative.
    pub fn arm<T: Observe>(
        &self,
        get: fn(&M) -> Option<&T>,
        get_mut: fn(&mut M) -> Option<&mut T>,
    ) -> T::Observer {
        self.arm_as::<T::Observer>(get, get_mut)
    }

    /// Bind a chosen adapter kind to an enum alternative.
    pub fn arm_as<A: Adapter>(
        &self,
        get: fn(&M) -> Option<&A::Model>,
        get_mut: fn(&mut M) -> Option<&mut A::Model>,
    ) -> A {
        A::bind(self.place.project(Arm::new(get, get_mut)), self.parent.clone())
    }

    /// Read the model being bound.
    pub fn model(&self) -> Ref<'_, M> {
        self.place.borrow()
    }
}

/// State shared between a class and the links of its members.
pub(crate) struct ClassCore<M: 'static> {
    place: Place<M>,
    parent: Parent,
    transaction: Cell<bool>,
    on_change: Signal<dyn Fn(&M)>,
}

impl<M: Clone + 'static> ClassCore<M> {
    fn emit(&self) {
        if self.on_change.is_empty() {
            return;
        }
        if let Some(model) = self.place.snapshot() {
            self.on_change.emit(|slot| slot(&model));
        }
    }

    /// Enter a transaction. Returns `false` if one is already open.
    pub(crate) fn begin(&self) -> bool {
        !self.transaction.replace(true)
    }

    /// Leave the transaction with one aggregate notification.
    pub(crate) fn commit(&self) {
        if !self.parent.is_suppressed() {
            self.emit();
        }
        self.transaction.set(false);
        self.parent.notify();
    }
}

impl<M: Clone + 'static> Propagate for ClassCore<M> {
    fn child_changed(&self) {
        if self.suppressed() {
            trace!("class change held back by transaction");
            return;
        }
        self.emit();
        self.parent.notify();
    }

    fn suppressed(&self) -> bool {
        self.transaction.get() || self.parent.is_suppressed()
    }
}

/// An observable struct composed of member adapters.
pub struct Class<M: ClassModel> {
    core: Rc<ClassCore<M>>,
    members: M::Members,
}

impl<M: ClassModel> Class<M> {
    /// Wrap `model` in a fresh shared cell.
    pub fn new(model: M) -> Self {
        Self::bind(Place::new(model), Parent::none())
    }

    /// Observe a model the caller keeps a handle to.
    pub fn from_shared(model: Rc<RefCell<M>>) -> Self {
        Self::bind(Place::from_shared(model), Parent::none())
    }

    /// The adapter of the member selected by `Tag`.
    pub fn get<Tag>(&self) -> &<M as Member<Tag>>::Adapter
    where
        M: Member<Tag>,
    {
        <M as Member<Tag>>::member(&self.members)
    }

    /// Replace the member selected by `Tag`.
    pub fn set<Tag>(&self, value: <<M as Member<Tag>>::Adapter as Adapter>::Model)
    where
        M: Member<Tag>,
    {
        self.get::<Tag>().set(value);
    }

    /// Mutate the member selected by `Tag` in place.
    pub fn apply<Tag, F>(&self, f: F)
    where
        M: Member<Tag>,
        F: FnOnce(&mut <<M as Member<Tag>>::Adapter as Adapter>::Model),
    {
        self.get::<Tag>().apply(f);
    }

    /// Subscribe to one member's own changes.
    pub fn on_member_change<Tag, F>(&self, f: F) -> Connection
    where
        M: Member<Tag>,
        F: Fn(&<<M as Member<Tag>>::Adapter as Adapter>::Model) + 'static,
    {
        self.get::<Tag>().on_change(f)
    }

    /// Subscribe to any change of the class. The callback receives the
    /// whole model.
    pub fn on_change<F: Fn(&M) + 'static>(&self, f: F) -> Connection {
        self.core.on_change.connect(Rc::new(f))
    }

    /// Read the whole model.
    pub fn model(&self) -> Ref<'_, M> {
        self.core.place.borrow()
    }

    /// All member adapters.
    pub fn members(&self) -> &M::Members {
        &self.members
    }

    /// Replace the whole model. Only the aggregate signal fires.
    pub fn replace(&self, model: M) {
        *self.core.place.borrow_mut() = model;
        self.core.child_changed();
    }

    /// Mutate the whole model in place. Only the aggregate signal fires.
    pub fn update<F: FnOnce(&mut M)>(&self, f: F) {
        f(&mut *self.core.place.borrow_mut());
        self.core.child_changed();
    }

    /// Hold back member notifications until the returned guard is dropped.
    ///
    /// Fails with [`ObservableError::TransactionActive`](crate::ObservableError::TransactionActive)
    /// if a transaction is already open on this class.
    pub fn transaction(&self) -> Result<Transaction<'_, M>> {
        Transaction::begin(self)
    }

    /// Whether a transaction is open on this class.
    pub fn is_under_transaction(&self) -> bool {
        self.core.transaction.get()
    }

    pub(crate) fn core(&self) -> &ClassCore<M> {
        &self.core
    }
}

impl<M: ClassModel> Adapter for Class<M> {
    type Model = M;

    fn bind(place: Place<M>, parent: Parent) -> Self {
        let core = Rc::new(ClassCore {
            place: place.clone(),
            parent,
            transaction: Cell::new(false),
            on_change: Signal::new(),
        });
        let binder = Binder::new(place, Parent::of(&core));
        let members = M::bind_members(&binder);
        Self { core, members }
    }

    fn place(&self) -> &Place<M> {
        &self.core.place
    }

    fn set(&self, value: M) {
        self.replace(value);
    }

    fn apply<F: FnOnce(&mut M)>(&self, f: F) {
        self.update(f);
    }

    fn on_change<F: Fn(&M) + 'static>(&self, f: F) -> Connection {
        Class::on_change(self, f)
    }
}

/// Two classes are equal when their models are equal.
impl<M: ClassModel + PartialEq> PartialEq for Class<M> {
    fn eq(&self, other: &Self) -> bool {
        *self.model() == *other.model()
    }
}

impl<M: ClassModel + fmt::Debug> fmt::Debug for Class<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("model", &self.core.place)
            .field("under_transaction", &self.is_under_transaction())
            .field("subscribers", &self.core.on_change.slot_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
