//! Variant Observable
//!
//! A [`Variant`] wraps a closed sum type (a Rust enum). Assigning a new
//! value always emits `on_change`; `on_change_type` fires only when the
//! active alternative changed, compared by discriminant, never by value.
//!
//! # Visiting
//!
//! [`Variant::visit`] binds a fresh adapter to the active alternative on
//! every call and hands it to the visitor wrapped in the model's
//! [`VariantModel::Observed`] enum. Matching on that enum is how a visitor
//! picks the branch for each alternative. The adapters are not cached: one
//! obtained before a type-changing `set` is detached afterwards.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;

use tracing::trace;

use super::class::Binder;
use super::parent::Propagate;
use super::{Adapter, Parent};
use crate::place::Place;
use crate::signal::{Connection, Signal};

/// An enum whose active alternative can be observed.
///
/// ```rust
/// use observable_core::observable::{Binder, Value, Variant, VariantModel};
///
/// #[derive(Clone)]
/// enum Shape {
///     Circle(f64),
///     Label(String),
/// }
///
/// enum ShapeObserver {
///     Circle(Value<f64>),
///     Label(Value<String>),
/// }
///
/// impl VariantModel for Shape {
///     type Observed = ShapeObserver;
///
///     fn observe_active(b: &Binder<Self>) -> ShapeObserver {
///         let is_circle = matches!(*b.model(), Shape::Circle(_));
///         if is_circle {
///             ShapeObserver::Circle(b.arm(
///                 |s| match s { Shape::Circle(r) => Some(r), _ => None },
///                 |s| match s { Shape::Circle(r) => Some(r), _ => None },
///             ))
///         } else {
///             ShapeObserver::Label(b.arm(
///                 |s| match s { Shape::Label(t) => Some(t), _ => None },
///                 |s| match s { Shape::Label(t) => Some(t), _ => None },
///             ))
///         }
///     }
/// }
///
/// let shape = Variant::new(Shape::Circle(1.0));
/// shape.visit(|observed| match observed {
///     ShapeObserver::Circle(radius) => radius.set(2.0),
///     ShapeObserver::Label(text) => text.set("none".into()),
/// });
/// assert!(matches!(*shape.get(), Shape::Circle(r) if r == 2.0));
/// ```
pub trait VariantModel: Clone + 'static {
    /// One adapter per alternative, usually an enum mirroring `Self`.
    type Observed;

    /// Bind an adapter to the currently active alternative.
    fn observe_active(binder: &Binder<Self>) -> Self::Observed;
}

struct VariantCore<E: 'static> {
    place: Place<E>,
    parent: Parent,
    on_change: Signal<dyn Fn(&E)>,
    on_change_type: Signal<dyn Fn(&E)>,
}

impl<E: Clone + 'static> VariantCore<E> {
    fn changed(&self, type_changed: bool) {
        if self.parent.is_suppressed() {
            trace!("variant change held back by transaction");
            return;
        }
        let wanted = !self.on_change.is_empty() || (type_changed && !self.on_change_type.is_empty());
        if let Some(value) = wanted.then(|| self.place.snapshot()).flatten() {
            self.on_change.emit(|slot| slot(&value));
            if type_changed {
                self.on_change_type.emit(|slot| slot(&value));
            }
        }
        self.parent.notify();
    }
}

impl<E: Clone + 'static> Propagate for VariantCore<E> {
    fn child_changed(&self) {
        self.changed(false);
    }

    fn suppressed(&self) -> bool {
        self.parent.is_suppressed()
    }
}

/// An observable enum.
pub struct Variant<E: VariantModel> {
    core: Rc<VariantCore<E>>,
}

impl<E: VariantModel> Variant<E> {
    /// Wrap `value` in a fresh model of its own.
    pub fn new(value: E) -> Self {
        Self::bind(Place::new(value), Parent::none())
    }

    /// Observe a model the caller keeps a handle to.
    pub fn from_shared(model: Rc<RefCell<E>>) -> Self {
        Self::bind(Place::from_shared(model), Parent::none())
    }

    /// Read the current value.
    pub fn get(&self) -> Ref<'_, E> {
        self.core.place.borrow()
    }

    /// Replace the value.
    pub fn set(&self, value: E) {
        let type_changed = {
            let mut current = self.core.place.borrow_mut();
            let before = mem::discriminant(&*current);
            *current = value;
            before != mem::discriminant(&*current)
        };
        self.core.changed(type_changed);
    }

    /// Mutate the value in place. May switch alternatives.
    pub fn apply<F: FnOnce(&mut E)>(&self, f: F) {
        let type_changed = {
            let mut current = self.core.place.borrow_mut();
            let before = mem::discriminant(&*current);
            f(&mut *current);
            before != mem::discriminant(&*current)
        };
        self.core.changed(type_changed);
    }

    /// Subscribe to every change.
    pub fn on_change<F: Fn(&E) + 'static>(&self, f: F) -> Connection {
        self.core.on_change.connect(Rc::new(f))
    }

    /// Subscribe to changes of the active alternative.
    pub fn on_change_type<F: Fn(&E) + 'static>(&self, f: F) -> Connection {
        self.core.on_change_type.connect(Rc::new(f))
    }

    /// Whether `other` is the same alternative as the current value.
    pub fn holds_same_alternative(&self, other: &E) -> bool {
        mem::discriminant(&*self.get()) == mem::discriminant(other)
    }

    /// Bind a fresh adapter to the active alternative.
    pub fn observed(&self) -> E::Observed {
        let binder = Binder::new(self.core.place.clone(), Parent::of(&self.core));
        E::observe_active(&binder)
    }

    /// Run `visitor` on a fresh adapter of the active alternative.
    pub fn visit<R, F: FnOnce(E::Observed) -> R>(&self, visitor: F) -> R {
        visitor(self.observed())
    }
}

impl<E: VariantModel> Adapter for Variant<E> {
    type Model = E;

    fn bind(place: Place<E>, parent: Parent) -> Self {
        Self {
            core: Rc::new(VariantCore {
                place,
                parent,
                on_change: Signal::new(),
                on_change_type: Signal::new(),
            }),
        }
    }

    fn place(&self) -> &Place<E> {
        &self.core.place
    }

    fn set(&self, value: E) {
        Variant::set(self, value);
    }

    fn apply<F: FnOnce(&mut E)>(&self, f: F) {
        Variant::apply(self, f);
    }

    fn on_change<F: Fn(&E) + 'static>(&self, f: F) -> Connection {
        Variant::on_change(self, f)
    }
}

impl<E: VariantModel + PartialEq> PartialEq for Variant<E> {
    fn eq(&self, other: &Self) -> bool {
        *self.get() == *other.get()
    }
}

impl<E: VariantModel + fmt::Debug> fmt::Debug for Variant<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("value", &self.core.place)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObservableError;
    use crate::observable::Value;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    enum Slot {
        Number(i32),
        Text(String),
    }

    enum SlotObserver {
        Number(Value<i32>),
        Text(Value<String>),
    }

    impl VariantModel for Slot {
        type Observed = SlotObserver;

        fn observe_active(b: &Binder<Self>) -> SlotObserver {
            let is_number = matches!(*b.model(), Slot::Number(_));
            if is_number {
                SlotObserver::Number(b.arm(
                    |s| match s {
                        Slot::Number(n) => Some(n),
                        _ => None,
                    },
                    |s| match s {
                        Slot::Number(n) => Some(n),
                        _ => None,
                    },
                ))
            } else {
                SlotObserver::Text(b.arm(
                    |s| match s {
                        Slot::Text(t) => Some(t),
                        _ => None,
                    },
                    |s| match s {
                        Slot::Text(t) => Some(t),
                        _ => None,
                    },
                ))
            }
        }
    }

    fn counters(variant: &Variant<Slot>) -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let changes = Rc::new(Cell::new(0));
        let type_changes = Rc::new(Cell::new(0));
        let (c, t) = (Rc::clone(&changes), Rc::clone(&type_changes));
        variant.on_change(move |_| c.set(c.get() + 1));
        variant.on_change_type(move |_| t.set(t.get() + 1));
        (changes, type_changes)
    }

    #[test]
    fn type_change_fires_both_signals() {
        let variant = Variant::new(Slot::Number(1));
        let (changes, type_changes) = counters(&variant);

        variant.set(Slot::Text("hello".to_string()));
        assert_eq!(changes.get(), 1);
        assert_eq!(type_changes.get(), 1);

        variant.set(Slot::Text("world".to_string()));
        assert_eq!(changes.get(), 2);
        assert_eq!(type_changes.get(), 1);
    }

    #[test]
    fn apply_compares_discriminants() {
        let variant = Variant::new(Slot::Number(1));
        let (changes, type_changes) = counters(&variant);

        variant.apply(|s| {
            if let Slot::Number(n) = s {
                *n += 1;
            }
        });
        assert_eq!(type_changes.get(), 0);

        variant.apply(|s| *s = Slot::Text(String::new()));
        assert_eq!(changes.get(), 2);
        assert_eq!(type_changes.get(), 1);
    }

    #[test]
    fn visit_dispatches_on_active_alternative() {
        let variant = Variant::new(Slot::Text("a".to_string()));

        let visited = variant.visit(|observed| match observed {
            SlotObserver::Number(_) => "number",
            SlotObserver::Text(_) => "text",
        });
        assert_eq!(visited, "text");
    }

    #[test]
    fn change_through_alternative_fires_on_change_only() {
        let variant = Variant::new(Slot::Number(1));
        let (changes, type_changes) = counters(&variant);

        variant.visit(|observed| {
            if let SlotObserver::Number(n) = observed {
                n.set(5);
            }
        });

        assert_eq!(*variant.get(), Slot::Number(5));
        assert_eq!(changes.get(), 1);
        assert_eq!(type_changes.get(), 0);
    }

    #[test]
    fn retained_alternative_detaches_after_type_change() {
        let variant = Variant::new(Slot::Number(1));
        let number = match variant.observed() {
            SlotObserver::Number(n) => n,
            SlotObserver::Text(_) => unreachable!(),
        };

        variant.set(Slot::Text("t".to_string()));
        assert!(matches!(number.try_get(), Err(ObservableError::Detached)));
    }

    #[test]
    fn type_subscriber_can_reset_the_value() {
        let variant = Rc::new(Variant::new(Slot::Number(1)));
        let writer = Rc::clone(&variant);
        variant.on_change_type(move |s| {
            if let Slot::Text(t) = s {
                if t.is_empty() {
                    writer.set(Slot::Number(0));
                }
            }
        });

        variant.set(Slot::Text(String::new()));
        assert_eq!(*variant.get(), Slot::Number(0));
    }

    #[test]
    fn same_alternative_check_ignores_payload() {
        let variant = Variant::new(Slot::Number(1));
        assert!(variant.holds_same_alternative(&Slot::Number(99)));
        assert!(!variant.holds_same_alternative(&Slot::Text(String::new())));
    }
}
