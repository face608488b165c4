//! Map Observables
//!
//! [`Map`] (over `BTreeMap`) and [`UnorderedMap`] (over `HashMap`) share
//! one implementation, [`Keyed`], generic over the [`Associative`] trait.
//! The two only differ in a few inherent methods: ordered maps know their
//! first and last keys and can erase a key range, hashed maps expose their
//! capacity.
//!
//! Signals mirror [`Vector`](super::Vector) with keys in place of
//! positions. An element's identity is its key, so a cached element
//! adapter stays valid across unrelated inserts and erases. Once its own
//! key leaves the map the adapter is detached, and it stays detached if the
//! key is inserted again: the new entry gets a new adapter.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::mem;
use std::ops::RangeBounds;
use std::rc::Rc;

use tracing::{debug, trace};

use super::cache::{RefCache, Shared, Slot};
use crate::error::{ObservableError, Result};
use crate::observable::{Adapter, ElementOwner, Observe, Parent};
use crate::place::{Place, Project};
use crate::signal::{Connection, Signal};

/// The operations [`Keyed`] needs from a map type.
pub trait Associative: Default + Clone + 'static {
    /// Key type.
    type Key: Hash + Eq + Clone + 'static;
    /// Mapped type.
    type Value: Clone + 'static;

    /// Number of entries.
    fn len(&self) -> usize;
    /// The value stored under `key`.
    fn lookup(&self, key: &Self::Key) -> Option<&Self::Value>;
    /// Mutable access to the value stored under `key`.
    fn lookup_mut(&mut self, key: &Self::Key) -> Option<&mut Self::Value>;
    /// Store `value` under `key`, returning the previous value.
    fn put(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;
    /// Remove and return the value stored under `key`.
    fn take(&mut self, key: &Self::Key) -> Option<Self::Value>;
    /// Every entry, in the map's iteration order.
    fn entries(&self) -> Vec<(&Self::Key, &Self::Value)>;
    /// Remove every entry, in iteration order, keeping whatever the map
    /// allocated.
    fn drain_entries(&mut self) -> Vec<(Self::Key, Self::Value)>;
}

impl<K: Ord + Hash + Clone + 'static, V: Clone + 'static> Associative for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn lookup_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn take(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn drain_entries(&mut self) -> Vec<(K, V)> {
        mem::take(self).into_iter().collect()
    }
}

impl<K: Hash + Eq + Clone + 'static, V: Clone + 'static> Associative for HashMap<K, V> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn lookup_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn take(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn drain_entries(&mut self) -> Vec<(K, V)> {
        self.drain().collect()
    }
}

/// The value stored under one key of a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key<K>(pub K);

impl<C: Associative> Project<C, C::Value> for Key<C::Key> {
    fn project<'a>(&self, parent: &'a C) -> Option<&'a C::Value> {
        parent.lookup(&self.0)
    }

    fn project_mut<'a>(&self, parent: &'a mut C) -> Option<&'a mut C::Value> {
        parent.lookup_mut(&self.0)
    }
}

/// A map element reached through its cache slot.
struct TrackedKey<K>(Slot<K>);

impl<C: Associative> Project<C, C::Value> for TrackedKey<C::Key> {
    fn project<'a>(&self, parent: &'a C) -> Option<&'a C::Value> {
        parent.lookup(&self.0.key()?)
    }

    fn project_mut<'a>(&self, parent: &'a mut C) -> Option<&'a mut C::Value> {
        parent.lookup_mut(&self.0.key()?)
    }
}

struct KeyedCore<C: Associative>
where
    C::Value: Observe,
{
    place: Place<C>,
    parent: Parent,
    cache: RefCache<C::Key, <C::Value as Observe>::Observer>,
    before_erase: Signal<dyn Fn(&C::Key, &C::Value) -> bool>,
    after_erase: Signal<dyn Fn(&C::Key, &C::Value)>,
    after_insert: Signal<dyn Fn(&C::Key, &C::Value)>,
    on_change: Signal<dyn Fn(&C)>,
    on_value_change: Signal<dyn Fn(&C::Key, &C::Value)>,
}

impl<C: Associative> KeyedCore<C>
where
    C::Value: Observe,
{
    fn value_of(&self, key: &C::Key) -> Option<C::Value> {
        self.place.borrow().lookup(key).cloned()
    }

    /// Ask `before_erase` about every key in `keys`.
    fn allow_erase(&self, keys: &[C::Key]) -> bool {
        if self.before_erase.is_empty() {
            return true;
        }
        for key in keys {
            let Some(value) = self.value_of(key) else {
                continue;
            };
            if !self.before_erase.emit_while(|slot| slot(key, &value)) {
                debug!("map erase vetoed");
                return false;
            }
        }
        true
    }

    fn inserted(&self, keys: &[C::Key]) {
        if self.held_back() {
            return;
        }
        if !self.after_insert.is_empty() {
            for key in keys {
                if let Some(value) = self.value_of(key) {
                    self.after_insert.emit(|slot| slot(key, &value));
                }
            }
        }
        self.changed();
    }

    fn erased(&self, removed: &[(C::Key, C::Value)]) {
        for (key, _) in removed {
            self.cache.evict(key);
        }
        if !removed.is_empty() {
            debug!(erased = removed.len(), "detached erased map elements");
        }
        if self.held_back() {
            return;
        }
        for (key, value) in removed {
            self.after_erase.emit(|slot| slot(key, value));
        }
        self.changed();
    }

    /// The whole content was replaced.
    fn replaced(&self) {
        {
            let map = self.place.borrow();
            let evicted = self.cache.evict_if(|key| map.lookup(key).is_none());
            if evicted > 0 {
                debug!(evicted, "evicted vanished map elements");
            }
        }
        if self.held_back() {
            return;
        }
        self.changed();
    }

    fn value_changed(&self, key: &C::Key) {
        if self.held_back() {
            return;
        }
        if !self.on_value_change.is_empty() {
            if let Some(value) = self.value_of(key) {
                self.on_value_change.emit(|slot| slot(key, &value));
            }
        }
        self.changed();
    }

    fn changed(&self) {
        trace!("map changed");
        if !self.on_change.is_empty() {
            if let Some(map) = self.place.snapshot() {
                self.on_change.emit(|slot| slot(&map));
            }
        }
        self.parent.notify();
    }

    fn held_back(&self) -> bool {
        let held = self.parent.is_suppressed();
        if held {
            trace!("map change held back by transaction");
        }
        held
    }

    /// Remove `keys` after asking `before_erase`. All or nothing.
    fn erase_keys(&self, keys: &[C::Key]) -> Option<Vec<(C::Key, C::Value)>> {
        if !self.allow_erase(keys) {
            return None;
        }
        let removed: Vec<_> = {
            let mut map = self.place.borrow_mut();
            keys.iter()
                .filter_map(|key| map.take(key).map(|value| (key.clone(), value)))
                .collect()
        };
        self.erased(&removed);
        Some(removed)
    }
}

impl<C: Associative> ElementOwner<Slot<C::Key>> for KeyedCore<C>
where
    C::Value: Observe,
{
    fn element_changed(&self, slot: &Slot<C::Key>) {
        if let Some(key) = slot.key() {
            self.value_changed(&key);
        }
    }

    fn suppressed(&self) -> bool {
        self.parent.is_suppressed()
    }
}

/// An observable map.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use observable_core::container::Map;
///
/// let scores: Map<String, u32> = Map::new(BTreeMap::new());
/// scores.on_after_insert(|name, score| println!("{name} joined with {score}"));
///
/// assert!(scores.insert("ada".to_string(), 3));
/// assert!(!scores.insert("ada".to_string(), 4));
/// assert_eq!(*scores.at(&"ada".to_string()).unwrap(), 3);
/// ```
pub struct Keyed<C: Associative>
where
    C::Value: Observe,
{
    core: Rc<KeyedCore<C>>,
}

/// Ordered map observable.
pub type Map<K, V> = Keyed<BTreeMap<K, V>>;

/// Hashed map observable.
pub type UnorderedMap<K, V> = Keyed<HashMap<K, V>>;

/// The shared element adapter of a map.
pub type MapElement<C> = Rc<Shared<<<C as Associative>::Value as Observe>::Observer>>;

impl<C: Associative> Keyed<C>
where
    C::Value: Observe,
{
    /// Wrap `map` in a fresh model of its own.
    pub fn new(map: C) -> Self {
        Self::bind(Place::new(map), Parent::none())
    }

    /// Observe a model the caller keeps a handle to.
    pub fn from_shared(model: Rc<RefCell<C>>) -> Self {
        Self::bind(Place::from_shared(model), Parent::none())
    }

    // ---- Reading ----

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.core.place.borrow().len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &C::Key) -> bool {
        self.core.place.borrow().lookup(key).is_some()
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &C::Key) -> Option<Ref<'_, C::Value>> {
        Ref::filter_map(self.core.place.borrow(), |map| map.lookup(key)).ok()
    }

    /// The value stored under `key`, failing with
    /// [`ObservableError::KeyNotFound`].
    pub fn at(&self, key: &C::Key) -> Result<Ref<'_, C::Value>> {
        self.get(key).ok_or(ObservableError::KeyNotFound)
    }

    /// Every key, in iteration order.
    pub fn keys(&self) -> Vec<C::Key> {
        self.core
            .place
            .borrow()
            .entries()
            .into_iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// The whole map.
    pub fn model(&self) -> Ref<'_, C> {
        self.core.place.borrow()
    }

    // ---- Insertion ----

    /// Insert `value` under `key` unless the key is present. Returns
    /// whether it was inserted; an existing entry is left untouched.
    pub fn insert(&self, key: C::Key, value: C::Value) -> bool {
        {
            let mut map = self.core.place.borrow_mut();
            if map.lookup(&key).is_some() {
                return false;
            }
            map.put(key.clone(), value);
        }
        self.core.inserted(std::slice::from_ref(&key));
        true
    }

    /// Insert or overwrite. Returns `true` if the key was new; an
    /// overwrite is reported as an element change.
    pub fn insert_or_assign(&self, key: C::Key, value: C::Value) -> bool {
        let previous = self.core.place.borrow_mut().put(key.clone(), value);
        match previous {
            Some(_) => {
                self.core.value_changed(&key);
                false
            }
            None => {
                self.core.inserted(std::slice::from_ref(&key));
                true
            }
        }
    }

    /// Insert every entry of `iter` whose key is not present yet. Returns
    /// how many were inserted; `on_change` fires once.
    pub fn extend<I: IntoIterator<Item = (C::Key, C::Value)>>(&self, iter: I) -> usize {
        let inserted: Vec<C::Key> = {
            let mut map = self.core.place.borrow_mut();
            iter.into_iter()
                .filter_map(|(key, value)| {
                    if map.lookup(&key).is_some() {
                        return None;
                    }
                    map.put(key.clone(), value);
                    Some(key)
                })
                .collect()
        };
        if !inserted.is_empty() {
            self.core.inserted(&inserted);
        }
        inserted.len()
    }

    /// Overwrite the value of an existing key; reported as an element
    /// change.
    pub fn assign(&self, key: &C::Key, value: C::Value) -> Result<()> {
        {
            let mut map = self.core.place.borrow_mut();
            let slot = map.lookup_mut(key).ok_or(ObservableError::KeyNotFound)?;
            *slot = value;
        }
        self.core.value_changed(key);
        Ok(())
    }

    // ---- Removal ----

    /// Remove the entry under `key`.
    ///
    /// Returns `None` when the key is absent or a `before_erase`
    /// subscriber refused.
    pub fn erase(&self, key: &C::Key) -> Option<C::Value> {
        if !self.contains_key(key) {
            return None;
        }
        self.core
            .erase_keys(std::slice::from_ref(key))?
            .pop()
            .map(|(_, value)| value)
    }

    /// Remove every entry, keeping the map's allocation. Returns `false`
    /// if vetoed; clearing an empty map is a silent no-op.
    pub fn clear(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let keys = self.keys();
        if !self.core.allow_erase(&keys) {
            return false;
        }
        let removed = self.core.place.borrow_mut().drain_entries();
        self.core.erased(&removed);
        true
    }

    /// Exchange contents with `other`.
    pub fn swap(&self, other: &mut C) {
        mem::swap(&mut *self.core.place.borrow_mut(), other);
        self.core.replaced();
    }

    // ---- Element handles ----

    /// The shared adapter of the value under `key`.
    pub fn element(&self, key: &C::Key) -> Option<MapElement<C>> {
        if !self.contains_key(key) {
            return None;
        }
        let core = &self.core;
        Some(core.cache.get_or_create(key.clone(), |slot| {
            <<C::Value as Observe>::Observer as Adapter>::bind(
                core.place.project(TrackedKey(slot.clone())),
                Parent::element(core, slot.clone()),
            )
        }))
    }

    /// Like [`Keyed::element`], failing with
    /// [`ObservableError::KeyNotFound`].
    pub fn element_at(&self, key: &C::Key) -> Result<MapElement<C>> {
        self.element(key).ok_or(ObservableError::KeyNotFound)
    }

    /// Every key with the shared adapter of its value, in iteration
    /// order.
    ///
    /// Each adapter is the same handle [`Keyed::element`] returns for that
    /// key.
    pub fn elements(&self) -> impl Iterator<Item = (C::Key, MapElement<C>)> + '_ {
        self.keys()
            .into_iter()
            .filter_map(move |key| self.element(&key).map(|element| (key, element)))
    }

    /// Number of element adapters currently alive in the cache.
    pub fn cached_elements(&self) -> usize {
        self.core.cache.len()
    }

    // ---- Subscriptions ----

    /// Veto subscription: return `false` to keep the entry.
    pub fn on_before_erase<F>(&self, f: F) -> Connection
    where
        F: Fn(&C::Key, &C::Value) -> bool + 'static,
    {
        self.core.before_erase.connect(Rc::new(f))
    }

    /// Called with each removed entry.
    pub fn on_after_erase<F>(&self, f: F) -> Connection
    where
        F: Fn(&C::Key, &C::Value) + 'static,
    {
        self.core.after_erase.connect(Rc::new(f))
    }

    /// Called with each inserted entry.
    pub fn on_after_insert<F>(&self, f: F) -> Connection
    where
        F: Fn(&C::Key, &C::Value) + 'static,
    {
        self.core.after_insert.connect(Rc::new(f))
    }

    /// Called once after any mutation.
    pub fn on_change<F: Fn(&C) + 'static>(&self, f: F) -> Connection {
        self.core.on_change.connect(Rc::new(f))
    }

    /// Called when the value under a key changed in place.
    pub fn on_value_change<F>(&self, f: F) -> Connection
    where
        F: Fn(&C::Key, &C::Value) + 'static,
    {
        self.core.on_value_change.connect(Rc::new(f))
    }
}

impl<K, V> Keyed<BTreeMap<K, V>>
where
    K: Ord + Hash + Clone + 'static,
    V: Observe,
{
    /// The smallest key.
    pub fn first_key(&self) -> Option<K> {
        self.model().keys().next().cloned()
    }

    /// The largest key.
    pub fn last_key(&self) -> Option<K> {
        self.model().keys().next_back().cloned()
    }

    /// Remove every entry whose key lies in `range`. Returns how many were
    /// removed, or `0` if any of them was vetoed.
    pub fn erase_range<Q, R>(&self, range: R) -> usize
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
        R: RangeBounds<Q>,
    {
        let keys: Vec<K> = self.model().range(range).map(|(k, _)| k.clone()).collect();
        if keys.is_empty() {
            return 0;
        }
        self.core
            .erase_keys(&keys)
            .map_or(0, |removed| removed.len())
    }
}

impl<K, V> Keyed<HashMap<K, V>>
where
    K: Hash + Eq + Clone + 'static,
    V: Observe,
{
    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.model().capacity()
    }

    /// Reserve room for `additional` entries. Not a content change.
    pub fn reserve(&self, additional: usize) {
        self.core.place.borrow_mut().reserve(additional);
    }
}

impl<C: Associative> Adapter for Keyed<C>
where
    C::Value: Observe,
{
    type Model = C;

    fn bind(place: Place<C>, parent: Parent) -> Self {
        Self {
            core: Rc::new(KeyedCore {
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

    fn place(&self) -> &Place<C> {
        &self.core.place
    }

    fn set(&self, map: C) {
        *self.core.place.borrow_mut() = map;
        self.core.replaced();
    }

    fn apply<F: FnOnce(&mut C)>(&self, f: F) {
        f(&mut *self.core.place.borrow_mut());
        self.core.replaced();
    }

    fn on_change<F: Fn(&C) + 'static>(&self, f: F) -> Connection {
        Keyed::on_change(self, f)
    }
}

impl<C: Associative + PartialEq> PartialEq for Keyed<C>
where
    C::Value: Observe,
{
    fn eq(&self, other: &Self) -> bool {
        *self.model() == *other.model()
    }
}

impl<C: Associative + fmt::Debug> fmt::Debug for Keyed<C>
where
    C::Value: Observe,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyed")
            .field("map", &self.core.place)
            .field("cached_elements", &self.cached_elements())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn map(entries: &[(&str, i32)]) -> Map<String, i32> {
        Map::new(entries.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    #[test]
    fn insert_never_overwrites() {
        let scores = map(&[("a", 1)]);
        let inserted = counter();
        let i = Rc::clone(&inserted);
        scores.on_after_insert(move |_, _| i.set(i.get() + 1));

        assert!(!scores.insert("a".to_string(), 9));
        assert!(scores.insert("b".to_string(), 2));

        assert_eq!(*scores.at(&"a".to_string()).unwrap(), 1);
        assert_eq!(inserted.get(), 1);
    }

    #[test]
    fn insert_fires_after_insert_then_on_change() {
        let scores = map(&[]);
        let events = Rc::new(RefCell::new(Vec::new()));

        let e = Rc::clone(&events);
        scores.on_after_insert(move |k, v| e.borrow_mut().push(format!("insert {k}={v}")));
        let e = Rc::clone(&events);
        scores.on_change(move |m| e.borrow_mut().push(format!("change {}", m.len())));

        scores.insert("x".to_string(), 1);
        assert_eq!(*events.borrow(), vec!["insert x=1", "change 1"]);
    }

    #[test]
    fn insert_or_assign_reports_overwrite_as_value_change() {
        let scores = map(&[("a", 1)]);
        let values = counter();
        let inserts = counter();
        let v = Rc::clone(&values);
        scores.on_value_change(move |_, _| v.set(v.get() + 1));
        let i = Rc::clone(&inserts);
        scores.on_after_insert(move |_, _| i.set(i.get() + 1));

        assert!(!scores.insert_or_assign("a".to_string(), 5));
        assert!(scores.insert_or_assign("b".to_string(), 6));

        assert_eq!(values.get(), 1);
        assert_eq!(inserts.get(), 1);
        assert_eq!(*scores.get(&"a".to_string()).unwrap(), 5);
    }

    #[test]
    fn extend_skips_present_keys_and_notifies_once() {
        let scores = map(&[("a", 1)]);
        let changes = counter();
        let c = Rc::clone(&changes);
        scores.on_change(move |_| c.set(c.get() + 1));

        let added = scores.extend([("a".to_string(), 9), ("b".to_string(), 2), ("c".to_string(), 3)]);

        assert_eq!(added, 2);
        assert_eq!(changes.get(), 1);
        assert_eq!(scores.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn vetoed_erase_leaves_map_untouched() {
        let scores = map(&[("a", 1), ("b", 2)]);
        let erased = counter();
        let e = Rc::clone(&erased);
        scores.on_before_erase(|key, _| key != "a");
        scores.on_after_erase(move |_, _| e.set(e.get() + 1));

        assert!(scores.erase(&"a".to_string()).is_none());
        assert!(!scores.clear());
        assert_eq!(scores.len(), 2);
        assert_eq!(erased.get(), 0);

        assert_eq!(scores.erase(&"b".to_string()), Some(2));
        assert_eq!(erased.get(), 1);
    }

    #[test]
    fn missing_key_reports_not_found() {
        let scores = map(&[]);
        assert!(matches!(
            scores.at(&"nope".to_string()),
            Err(ObservableError::KeyNotFound)
        ));
        assert!(scores.assign(&"nope".to_string(), 1).is_err());
        assert!(scores.element_at(&"nope".to_string()).is_err());
    }

    #[test]
    fn ordered_map_knows_its_ends_and_erases_ranges() {
        let numbers: Map<i32, i32> = Map::new((1..=5).map(|i| (i, i * 10)).collect());
        assert_eq!(numbers.first_key(), Some(1));
        assert_eq!(numbers.last_key(), Some(5));

        assert_eq!(numbers.erase_range(2..4), 2);
        assert_eq!(numbers.keys(), vec![1, 4, 5]);

        numbers.on_before_erase(|k, _| *k != 5);
        assert_eq!(numbers.erase_range(4..), 0);
        assert_eq!(numbers.len(), 3);
    }

    #[test]
    fn element_handle_survives_unrelated_erase() {
        let scores = map(&[("a", 1), ("b", 2)]);
        let a = scores.element(&"a".to_string()).unwrap();

        scores.erase(&"b".to_string());
        assert!(Rc::ptr_eq(&a, &scores.element(&"a".to_string()).unwrap()));

        scores.erase(&"a".to_string());
        assert!(!a.is_attached());
        assert!(scores.element(&"a".to_string()).is_none());
    }

    #[test]
    fn reinserted_key_gets_a_fresh_handle() {
        let scores = map(&[("a", 1)]);
        let old = scores.element(&"a".to_string()).unwrap();

        scores.erase(&"a".to_string());
        assert!(scores.insert("a".to_string(), 2));

        assert!(!old.is_attached());
        assert!(matches!(old.try_get(), Err(ObservableError::Detached)));

        let fresh = scores.element(&"a".to_string()).unwrap();
        assert!(!Rc::ptr_eq(&old, &fresh));
        assert_eq!(*fresh.get(), 2);
    }

    #[test]
    fn elements_iterate_the_cached_handles() {
        let scores = map(&[("a", 1), ("b", 2)]);
        let b = scores.element(&"b".to_string()).unwrap();

        let handles: Vec<_> = scores.elements().collect();

        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].0, "a");
        assert!(Rc::ptr_eq(&handles[1].1, &b));
        assert!(Rc::ptr_eq(&handles[0].1, &scores.element(&"a".to_string()).unwrap()));
    }

    #[test]
    fn clearing_an_empty_map_is_silent() {
        let scores = map(&[]);
        let changes = counter();
        let c = Rc::clone(&changes);
        scores.on_change(move |_| c.set(c.get() + 1));

        assert!(scores.clear());
        assert_eq!(changes.get(), 0);
    }

    #[test]
    fn clear_keeps_hashed_capacity() {
        let table: UnorderedMap<u8, bool> = UnorderedMap::new(HashMap::with_capacity(32));
        let erased = counter();
        let e = Rc::clone(&erased);
        table.on_after_erase(move |_, _| e.set(e.get() + 1));
        table.extend([(1, true), (2, false)]);

        assert!(table.clear());
        assert_eq!(erased.get(), 2);
        assert!(table.is_empty());
        assert!(table.capacity() >= 32);
    }

    #[test]
    fn subscriber_can_mutate_the_map() {
        let scores = Rc::new(map(&[]));

        // Every new player also gets an entry in the "total" row.
        let writer = Rc::clone(&scores);
        scores.on_after_insert(move |key, value| {
            if key != "total" {
                let total = writer.get(&"total".to_string()).map_or(0, |t| *t);
                writer.insert_or_assign("total".to_string(), total + value);
            }
        });

        scores.insert("a".to_string(), 3);
        scores.insert("b".to_string(), 4);

        assert_eq!(*scores.get(&"total".to_string()).unwrap(), 7);
    }

    #[test]
    fn key_projection_reaches_the_mapped_value() {
        let mut table: BTreeMap<String, i32> = [("a".to_string(), 1)].into_iter().collect();
        let key = Key("a".to_string());

        if let Some(value) = key.project_mut(&mut table) {
            *value += 1;
        }
        assert_eq!(key.project(&table), Some(&2));
        assert_eq!(Key("b".to_string()).project(&table), None);
    }

    #[test]
    fn element_change_reports_its_key() {
        let scores = map(&[("a", 1)]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        scores.on_value_change(move |k, v| s.borrow_mut().push((k.clone(), *v)));

        scores.element(&"a".to_string()).unwrap().apply(|v| *v += 10);

        assert_eq!(*seen.borrow(), vec![("a".to_string(), 11)]);
    }

    #[test]
    fn unordered_map_shares_the_implementation() {
        let table: UnorderedMap<u8, bool> = UnorderedMap::new(HashMap::new());
        table.reserve(16);
        assert!(table.capacity() >= 16);

        assert!(table.insert(1, true));
        assert!(table.contains_key(&1));
        assert_eq!(table.erase(&1), Some(true));
        assert!(table.is_empty());
    }

    #[test]
    fn set_evicts_vanished_keys() {
        let scores = map(&[("a", 1), ("b", 2)]);
        let _a = scores.element(&"a".to_string()).unwrap();
        let _b = scores.element(&"b".to_string()).unwrap();

        Adapter::set(&scores, [("b".to_string(), 3)].into_iter().collect());
        assert_eq!(scores.cached_elements(), 1);
    }
}
