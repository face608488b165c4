//! Transaction Scope
//!
//! A [`Transaction`] batches member mutations of one [`Class`]: while the
//! guard is alive the model is mutated immediately but nothing below the
//! class (and nothing above it) is notified. Dropping the guard fires the
//! class's aggregate signal exactly once and notifies the parent.
//!
//! Readers that look at the model mid-transaction already see the new
//! values while subscribers have not heard about them yet.
//!
//! Transactions do not nest: opening a second one on the same class fails
//! with [`ObservableError::TransactionActive`]. Transactions on different
//! classes of the same tree may overlap; an inner commit stays silent while
//! an enclosing class is still under transaction.

use tracing::debug;

use super::class::{Class, ClassModel};
use crate::error::{ObservableError, Result};

/// Guard that holds back notifications of a class until dropped.
///
/// The guard commits on every exit path, including early returns and
/// unwinding.
#[must_use = "dropping a Transaction commits it immediately"]
pub struct Transaction<'a, M: ClassModel> {
    class: &'a Class<M>,
}

impl<'a, M: ClassModel> Transaction<'a, M> {
    pub(crate) fn begin(class: &'a Class<M>) -> Result<Self> {
        if !class.core().begin() {
            debug!("rejected nested transaction");
            return Err(ObservableError::TransactionActive);
        }
        debug!("transaction opened");
        Ok(Self { class })
    }

    /// The class under transaction.
    pub fn class(&self) -> &'a Class<M> {
        self.class
    }
}

impl<M: ClassModel> Drop for Transaction<'_, M> {
    fn drop(&mut self) {
        debug!("transaction committed");
        self.class.core().commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::{Binder, Member, Observe, Value};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default, Clone)]
    struct Leaf {
        a: i32,
    }

    #[derive(Debug, Default, Clone)]
    struct Root {
        a: i32,
        b: i32,
        leaf: Leaf,
    }

    struct A;
    struct B;
    struct LeafTag;

    impl ClassModel for Leaf {
        type Members = Value<i32>;

        fn bind_members(binder: &Binder<Self>) -> Value<i32> {
            binder.field(|m| &m.a, |m| &mut m.a)
        }
    }

    impl Member<A> for Leaf {
        type Adapter = Value<i32>;

        fn member(members: &Value<i32>) -> &Value<i32> {
            members
        }
    }

    impl Observe for Leaf {
        type Observer = Class<Leaf>;
    }

    impl ClassModel for Root {
        type Members = (Value<i32>, Value<i32>, Class<Leaf>);

        fn bind_members(binder: &Binder<Self>) -> Self::Members {
            (
                binder.field(|m| &m.a, |m| &mut m.a),
                binder.field(|m| &m.b, |m| &mut m.b),
                binder.field(|m| &m.leaf, |m| &mut m.leaf),
            )
        }
    }

    impl Member<A> for Root {
        type Adapter = Value<i32>;

        fn member(members: &Self::Members) -> &Value<i32> {
            &members.0
        }
    }

    impl Member<B> for Root {
        type Adapter = Value<i32>;

        fn member(members: &Self::Members) -> &Value<i32> {
            &members.1
        }
    }

    impl Member<LeafTag> for Root {
        type Adapter = Class<Leaf>;

        fn member(members: &Self::Members) -> &Class<Leaf> {
            &members.2
        }
    }

    fn count_changes<M: ClassModel>(class: &Class<M>) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        class.on_change(move |_| count_clone.set(count_clone.get() + 1));
        count
    }

    #[test]
    fn mutations_inside_transaction_are_silent_until_commit() {
        let root = Class::new(Root::default());
        let root_changes = count_changes(&root);
        let member_changes = Rc::new(Cell::new(0));
        let member_clone = Rc::clone(&member_changes);
        root.on_member_change::<A, _>(move |_| member_clone.set(member_clone.get() + 1));

        {
            let _tx = root.transaction().unwrap();
            root.set::<A>(1);
            root.set::<B>(2);
            root.get::<LeafTag>().set::<A>(3);

            assert_eq!(root.model().a, 1);
            assert_eq!(root_changes.get(), 0);
            assert_eq!(member_changes.get(), 0);
        }

        assert_eq!(root_changes.get(), 1);
        assert_eq!(member_changes.get(), 0);
        assert!(!root.is_under_transaction());
    }

    #[test]
    fn empty_transaction_still_notifies_once() {
        let root = Class::new(Root::default());
        let root_changes = count_changes(&root);

        drop(root.transaction().unwrap());
        assert_eq!(root_changes.get(), 1);
    }

    #[test]
    fn nested_transaction_on_same_class_is_rejected() {
        let root = Class::new(Root::default());
        let _tx = root.transaction().unwrap();

        assert!(matches!(
            root.transaction(),
            Err(ObservableError::TransactionActive)
        ));
        assert!(root.is_under_transaction());
    }

    #[test]
    fn inner_commit_notifies_enclosing_class() {
        let root = Class::new(Root::default());
        let root_changes = count_changes(&root);
        let leaf_changes = count_changes(root.get::<LeafTag>());

        {
            let _tx = root.get::<LeafTag>().transaction().unwrap();
            root.get::<LeafTag>().set::<A>(1);
            root.get::<LeafTag>().set::<A>(2);
        }

        assert_eq!(leaf_changes.get(), 1);
        assert_eq!(root_changes.get(), 1);
    }

    #[test]
    fn inner_commit_stays_silent_under_outer_transaction() {
        let root = Class::new(Root::default());
        let root_changes = count_changes(&root);
        let leaf_changes = count_changes(root.get::<LeafTag>());

        {
            let _outer = root.transaction().unwrap();
            {
                let _inner = root.get::<LeafTag>().transaction().unwrap();
                root.get::<LeafTag>().set::<A>(1);
            }
            assert_eq!(leaf_changes.get(), 0);
            assert_eq!(root_changes.get(), 0);
        }

        assert_eq!(leaf_changes.get(), 0);
        assert_eq!(root_changes.get(), 1);
    }

    #[test]
    fn transaction_commits_when_unwinding() {
        let root = Rc::new(Class::new(Root::default()));
        let root_changes = count_changes(&root);

        let inner = Rc::clone(&root);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _tx = inner.transaction().unwrap();
            inner.set::<A>(5);
            panic!("abort batch");
        }));

        assert!(result.is_err());
        assert_eq!(root_changes.get(), 1);
        assert!(!root.is_under_transaction());
        assert_eq!(root.model().a, 5);
    }
}
