//! Observable Adapters
//!
//! This module holds the adapter kinds that make up an observable tree and
//! the traits that compose them.
//!
//! # Concepts
//!
//! ## Adapters
//!
//! An [`Adapter`] wraps one fragment of a model (addressed by a
//! [`Place`]) and exposes the fragment's mutating operations. Every
//! mutation first changes the model and then, unless a transaction holds
//! notifications back, emits the adapter's own signals and tells its
//! [`Parent`].
//!
//! ## Observe
//!
//! [`Observe`] picks the default adapter for a model type: scalars become
//! [`Value`]s, `Vec`s become [`Vector`](crate::container::Vector)s, user
//! structs become [`Class`]es and user enums become [`Variant`]s. Nested
//! models therefore get a tree of adapters that mirrors their shape.
//!
//! ## Classes and tags
//!
//! A [`Class`] composes named members. Members are selected with zero-sized
//! tag types through the [`Member`] trait, so `class.get::<Tag>()` is
//! resolved at compile time and an unknown tag does not compile.
//!
//! # Notification order
//!
//! A leaf mutation notifies synchronously, leaf first: the leaf's own
//! signal, then each enclosing adapter's signal up to the root, all before
//! the mutating call returns.
//!
//! Payloads are copies of the model taken after the mutation, and no borrow
//! of the model is held while a subscriber runs. A subscriber may therefore
//! mutate the same tree (a derived member, say); it is up to the subscriber
//! not to recurse forever.

mod class;
mod parent;
mod transaction;
mod value;
mod variant;

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::place::Place;
use crate::signal::Connection;

pub use class::{Binder, Class, ClassModel, Member};
pub use parent::Parent;
pub use transaction::Transaction;
pub use value::Value;
pub use variant::{Variant, VariantModel};

pub(crate) use parent::ElementOwner;

/// The uniform surface of every adapter kind.
pub trait Adapter: Sized + 'static {
    /// The model fragment this adapter wraps. Subscribers receive copies
    /// of it, so it must be `Clone`.
    type Model: Clone + 'static;

    /// Bind an adapter to `place`, reporting changes to `parent`.
    fn bind(place: Place<Self::Model>, parent: Parent) -> Self;

    /// Where the wrapped fragment lives.
    fn place(&self) -> &Place<Self::Model>;

    /// Replace the whole fragment.
    fn set(&self, value: Self::Model);

    /// Mutate the fragment in place.
    fn apply<F: FnOnce(&mut Self::Model)>(&self, f: F);

    /// Subscribe to changes of this fragment.
    fn on_change<F: Fn(&Self::Model) + 'static>(&self, f: F) -> Connection;

    /// Read the wrapped fragment.
    fn model(&self) -> Ref<'_, Self::Model> {
        self.place().borrow()
    }
}

/// Maps a model type to its default adapter.
pub trait Observe: Clone + 'static {
    /// The adapter used when this type is a member or container element.
    type Observer: Adapter<Model = Self>;
}

macro_rules! observe_as_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Observe for $ty {
                type Observer = Value<$ty>;
            }
        )*
    };
}

observe_as_value!(
    bool, char, String, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

/// Bind the default adapter of `T` to a shared model.
///
/// The returned adapter and the caller share the model; mutations made
/// through the adapter are visible through `model`.
pub fn observe<T: Observe>(model: &Rc<RefCell<T>>) -> T::Observer {
    observe_as::<T::Observer>(model)
}

/// Bind a specific adapter kind to a shared model.
pub fn observe_as<A: Adapter>(model: &Rc<RefCell<A::Model>>) -> A {
    A::bind(Place::from_shared(Rc::clone(model)), Parent::none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn observe_binds_default_adapter() {
        let model = Rc::new(RefCell::new(3i32));
        let value: Value<i32> = observe(&model);

        value.set(4);
        assert_eq!(*model.borrow(), 4);
    }

    #[test]
    fn adapter_trait_is_usable_generically() {
        fn bump<A: Adapter<Model = u8>>(adapter: &A) {
            adapter.apply(|v| *v += 1);
        }

        let model = Rc::new(RefCell::new(1u8));
        let value = observe_as::<Value<u8>>(&model);
        let calls = Rc::new(Cell::new(0));
        let calls_clone = Rc::clone(&calls);
        Adapter::on_change(&value, move |_| calls_clone.set(calls_clone.get() + 1));

        bump(&value);
        assert_eq!(*Adapter::model(&value), 2);
        assert_eq!(calls.get(), 1);
    }
}
