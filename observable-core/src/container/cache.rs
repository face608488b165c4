//! Reference Cache
//!
//! Element adapters are created lazily and shared: asking a container for
//! the same element twice yields the same [`Shared`] handle as long as
//! somebody still holds it. The cache itself only keeps `Weak`s, so it
//! never extends an element adapter's life.
//!
//! # Slots
//!
//! Every entry owns a [`Slot`], the element's current identity (its index
//! or key). The adapter is bound through the slot, so when the container
//! moves an entry to a new key the live handle follows its element, and
//! when the container evicts an entry the slot is emptied and the handle is
//! detached for good, even if an element with the same key shows up later.
//!
//! # Eviction
//!
//! Entries disappear in two ways:
//!
//! 1. **Release**: the last `Rc<Shared<_>>` is dropped and the handle's
//!    release hook removes its own entry.
//! 2. **Invalidation**: the container evicts entries whose element is
//!    gone (erased keys and positions, replaced content).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::mem;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use tracing::trace;

type Release = Box<dyn FnOnce()>;

/// A shared adapter handle that runs a release hook when dropped.
pub struct Shared<A> {
    adapter: A,
    release: Option<Release>,
}

impl<A> Shared<A> {
    /// Wrap an adapter without a release hook.
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            release: None,
        }
    }

    pub(crate) fn with_release(adapter: A, release: Release) -> Self {
        Self {
            adapter,
            release: Some(release),
        }
    }
}

impl<A> Deref for Shared<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.adapter
    }
}

impl<A> Drop for Shared<A> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Shared<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&self.adapter).finish()
    }
}

/// The current identity of a cached element, `None` once it is gone.
pub struct Slot<K> {
    key: Rc<RefCell<Option<K>>>,
}

impl<K: Clone> Slot<K> {
    fn new(key: K) -> Self {
        Self {
            key: Rc::new(RefCell::new(Some(key))),
        }
    }

    /// The key the element currently lives under.
    pub fn key(&self) -> Option<K> {
        self.key.borrow().clone()
    }

    /// Whether the element still exists.
    pub fn is_live(&self) -> bool {
        self.key.borrow().is_some()
    }

    fn move_to(&self, key: Option<K>) {
        *self.key.borrow_mut() = key;
    }

    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.key, &other.key)
    }
}

impl<K> Clone for Slot<K> {
    fn clone(&self) -> Self {
        Self {
            key: Rc::clone(&self.key),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Slot<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.key.borrow()).finish()
    }
}

struct Entry<K, A> {
    handle: Weak<Shared<A>>,
    slot: Slot<K>,
}

type Entries<K, A> = RefCell<HashMap<K, Entry<K, A>>>;

/// Identity to shared-adapter map with weak entries.
pub struct RefCache<K, A> {
    entries: Rc<Entries<K, A>>,
}

impl<K: Hash + Eq + Clone + 'static, A: 'static> RefCache<K, A> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// The live handle for `key`, if any.
    pub fn get(&self, key: &K) -> Option<Rc<Shared<A>>> {
        self.entries
            .borrow()
            .get(key)
            .and_then(|entry| entry.handle.upgrade())
    }

    /// The live handle for `key`, creating one with `create` on a miss.
    ///
    /// `create` receives the new entry's slot; the adapter should reach its
    /// element through it.
    pub fn get_or_create(&self, key: K, create: impl FnOnce(&Slot<K>) -> A) -> Rc<Shared<A>> {
        if let Some(shared) = self.get(&key) {
            trace!("element cache hit");
            return shared;
        }
        trace!("element cache miss");

        let slot = Slot::new(key.clone());
        let entries = Rc::downgrade(&self.entries);
        let release_slot = slot.clone();
        let shared = Rc::new(Shared::with_release(
            create(&slot),
            Box::new(move || release_entry(&entries, &release_slot)),
        ));

        let handle = Rc::downgrade(&shared);
        if let Some(stale) = self.entries.borrow_mut().insert(key, Entry { handle, slot }) {
            stale.slot.move_to(None);
        }
        shared
    }

    /// Forget the entry for `key` and detach its handle. Returns whether
    /// there was one.
    pub fn evict(&self, key: &K) -> bool {
        let removed = self.entries.borrow_mut().remove(key);
        match removed {
            Some(entry) => {
                entry.slot.move_to(None);
                true
            }
            None => false,
        }
    }

    /// Evict every entry whose key matches `pred`. Returns how many were
    /// removed.
    pub fn evict_if(&self, mut pred: impl FnMut(&K) -> bool) -> usize {
        self.rekey(|key| (!pred(key)).then(|| key.clone()))
    }

    /// Move every entry to the key `remap` gives it. Entries mapped to
    /// `None` are evicted; returns how many.
    ///
    /// `remap` must not send two surviving entries to the same key.
    pub fn rekey(&self, mut remap: impl FnMut(&K) -> Option<K>) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        let old = mem::take(&mut *entries);
        for (key, entry) in old {
            let target = remap(&key);
            entry.slot.move_to(target.clone());
            if let Some(target) = target {
                entries.insert(target, entry);
            }
        }
        before - entries.len()
    }

    /// Evict every entry.
    pub fn clear(&self) {
        for (_, entry) in self.entries.borrow_mut().drain() {
            entry.slot.move_to(None);
        }
    }

    /// Number of entries whose handle is still alive.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.handle.strong_count() > 0)
            .count()
    }

    /// Whether no live handle is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn release_entry<K: Hash + Eq + Clone, A>(entries: &Weak<Entries<K, A>>, slot: &Slot<K>) {
    let Some(key) = slot.key() else {
        return;
    };
    let Some(entries) = entries.upgrade() else {
        return;
    };
    let Ok(mut entries) = entries.try_borrow_mut() else {
        return;
    };
    if entries.get(&key).is_some_and(|entry| entry.slot.same(slot)) {
        entries.remove(&key);
        trace!("released element cache entry");
    }
}

impl<K: Hash + Eq + Clone + 'static, A: 'static> Default for RefCache<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> fmt::Debug for RefCache<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCache")
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}
