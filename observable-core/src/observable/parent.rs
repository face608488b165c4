//! Parent links.
//!
//! A child adapter never owns its parent. It holds a [`Parent`], a small
//! strong handle to a link object which itself holds only a `Weak` to the
//! parent's shared core. Ownership therefore always points downwards (or
//! nowhere) and a dropped parent simply stops receiving notifications.

use std::fmt;
use std::rc::{Rc, Weak};

/// Something that can be told "one of your children changed".
pub(crate) trait Propagate {
    /// A child finished a mutation.
    fn child_changed(&self);

    /// Whether notifications are currently held back by a transaction on
    /// this node or one of its ancestors.
    fn suppressed(&self) -> bool;
}

/// A container core that can be told which of its elements changed.
pub(crate) trait ElementOwner<K> {
    fn element_changed(&self, key: &K);
    fn suppressed(&self) -> bool;
}

/// Link to a class or variant core.
struct CoreLink<P>(Weak<P>);

impl<P: Propagate> Propagate for CoreLink<P> {
    fn child_changed(&self) {
        if let Some(core) = self.0.upgrade() {
            core.child_changed();
        }
    }

    fn suppressed(&self) -> bool {
        self.0.upgrade().is_some_and(|core| core.suppressed())
    }
}

/// Link to a container core, remembering which element the child wraps.
struct ElementLink<K, C> {
    key: K,
    owner: Weak<C>,
}

impl<K, C: ElementOwner<K>> Propagate for ElementLink<K, C> {
    fn child_changed(&self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.element_changed(&self.key);
        }
    }

    fn suppressed(&self) -> bool {
        self.owner.upgrade().is_some_and(|owner| owner.suppressed())
    }
}

/// Non-owning back-reference from a child adapter to its enclosing adapter.
#[derive(Clone, Default)]
pub struct Parent {
    link: Option<Rc<dyn Propagate>>,
}

impl Parent {
    /// No parent: the adapter is a root.
    pub fn none() -> Self {
        Self { link: None }
    }

    pub(crate) fn of<P: Propagate + 'static>(core: &Rc<P>) -> Self {
        Self {
            link: Some(Rc::new(CoreLink(Rc::downgrade(core)))),
        }
    }

    pub(crate) fn element<K: 'static, C: ElementOwner<K> + 'static>(owner: &Rc<C>, key: K) -> Self {
        Self {
            link: Some(Rc::new(ElementLink {
                key,
                owner: Rc::downgrade(owner),
            })),
        }
    }

    /// Whether this adapter has no parent.
    pub fn is_root(&self) -> bool {
        self.link.is_none()
    }

    /// Whether an enclosing transaction currently holds notifications back.
    pub fn is_suppressed(&self) -> bool {
        self.link.as_ref().is_some_and(|link| link.suppressed())
    }

    /// Tell the parent that this child changed.
    pub fn notify(&self) {
        if let Some(link) = &self.link {
            link.child_changed();
        }
    }
}

impl fmt::Debug for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parent")
            .field("root", &self.is_root())
            .finish()
    }
}
