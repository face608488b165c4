//! Container Observables
//!
//! Observable wrappers for the standard collections:
//!
//! | Model           | Adapter               |
//! |-----------------|-----------------------|
//! | `Vec<T>`        | [`Vector<T>`]         |
//! | `BTreeMap<K, V>`| [`Map<K, V>`]         |
//! | `HashMap<K, V>` | [`UnorderedMap<K, V>`]|
//! | `HashSet<T>`    | [`UnorderedSet<T>`]   |
//!
//! # How Containers Work
//!
//! Every structural mutation follows the same sequence:
//!
//! 1. `before_erase` is asked about each element about to leave. The first
//!    `false` aborts the whole operation with a no-op result.
//! 2. The model is mutated.
//! 3. `after_erase` / `after_insert` fire once per affected element.
//! 4. `on_change` fires once.
//! 5. The container's parent is notified.
//!
//! Steps 3 to 5 are skipped while an enclosing class is under
//! transaction. Vetoes are still asked.
//!
//! Element types with an adapter of their own (anything that implements
//! [`Observe`]) can be reached through shared element handles, see
//! [`RefCache`]. A handle follows its element and is detached once the
//! element is erased.

mod cache;
mod keyed;
mod set;
mod vector;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::ops::{Bound, Range, RangeBounds};

use crate::observable::Observe;

pub use cache::{RefCache, Shared, Slot};
pub use keyed::{Associative, Key, Keyed, Map, MapElement, UnorderedMap};
pub use set::UnorderedSet;
pub use vector::Vector;

impl<T: Observe> Observe for Vec<T> {
    type Observer = Vector<T>;
}

impl<K: Ord + Hash + Clone + 'static, V: Observe> Observe for BTreeMap<K, V> {
    type Observer = Map<K, V>;
}

impl<K: Hash + Eq + Clone + 'static, V: Observe> Observe for HashMap<K, V> {
    type Observer = UnorderedMap<K, V>;
}

impl<T: Hash + Eq + Clone + 'static> Observe for HashSet<T> {
    type Observer = UnorderedSet<T>;
}

/// Turn `range` into a concrete index range within `0..len`.
pub(crate) fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Option<Range<usize>> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.checked_add(1)?,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end.checked_add(1)?,
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    (start <= end && end <= len).then_some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::observe;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn resolve_range_handles_every_bound_kind() {
        assert_eq!(resolve_range(.., 4), Some(0..4));
        assert_eq!(resolve_range(1..=2, 4), Some(1..3));
        assert_eq!(resolve_range(2.., 4), Some(2..4));
        assert_eq!(resolve_range(3..2, 4), None);
        assert_eq!(resolve_range(0..5, 4), None);
    }

    #[test]
    fn collections_observe_as_containers() {
        let model = Rc::new(RefCell::new(vec![vec![1, 2], vec![3]]));
        let outer: Vector<Vec<i32>> = observe(&model);

        let inner = outer.element(1).unwrap();
        inner.push(4);

        assert_eq!(model.borrow()[1], vec![3, 4]);
    }
}
