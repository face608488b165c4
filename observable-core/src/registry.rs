//! Shared Handles
//!
//! [`observe_shared`] returns *the* adapter for a model rather than a new
//! one: repeated calls for the same model and adapter kind hand out the
//! same [`Shared`] handle, so every caller talks to one set of signals.
//!
//! # How It Works
//!
//! A thread-local table maps `(adapter TypeId, model address)` to a weak
//! handle. A miss binds a fresh adapter and stores a `Weak` to it; the
//! handle's release hook removes the entry once the last `Rc` is gone.
//! The table never keeps an adapter (or its model) alive.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::container::Shared;
use crate::observable::{observe_as, Adapter};

type RegistryKey = (TypeId, usize);

thread_local! {
    static SHARED: RefCell<HashMap<RegistryKey, Weak<dyn Any>>> = RefCell::new(HashMap::new());
}

/// The shared adapter of kind `A` for `model`, created on first use.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use observable_core::observable::Value;
/// use observable_core::registry::observe_shared;
///
/// let model = Rc::new(RefCell::new(1));
/// let a = observe_shared::<Value<i32>>(&model);
/// let b = observe_shared::<Value<i32>>(&model);
/// assert!(Rc::ptr_eq(&a, &b));
/// ```
pub fn observe_shared<A: Adapter>(model: &Rc<RefCell<A::Model>>) -> Rc<Shared<A>> {
    let key: RegistryKey = (TypeId::of::<A>(), Rc::as_ptr(model) as usize);

    let existing = SHARED.with(|table| table.borrow().get(&key).and_then(Weak::upgrade));
    if let Some(shared) = existing.and_then(|any| any.downcast::<Shared<A>>().ok()) {
        return shared;
    }

    let shared = Rc::new(Shared::with_release(
        observe_as::<A>(model),
        Box::new(move || release(key)),
    ));
    let erased: Rc<dyn Any> = shared.clone();
    SHARED.with(|table| {
        table.borrow_mut().insert(key, Rc::downgrade(&erased));
    });
    debug!(address = key.1, "registered shared observable");
    shared
}

/// Number of live shared handles on this thread.
pub fn shared_count() -> usize {
    SHARED.with(|table| {
        table
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    })
}

fn release(key: RegistryKey) {
    // The table may already be gone during thread teardown.
    let _ = SHARED.try_with(|table| {
        let Ok(mut table) = table.try_borrow_mut() else {
            return;
        };
        if table.get(&key).is_some_and(|weak| weak.strong_count() == 0) {
            table.remove(&key);
            debug!(address = key.1, "released shared observable");
        }
    });
}
