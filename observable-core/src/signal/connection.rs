//! Connection handles for signal subscriptions.
//!
//! Every call to [`Signal::connect`](super::Signal::connect) hands back a
//! [`Connection`]. The connection does not keep the subscriber alive and does
//! not disconnect on drop; wrap it in a [`ScopedConnection`] for that.

use std::fmt;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    /// Generate a new unique slot ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a signal's subscriber table.
pub(crate) trait SlotTable {
    fn remove_slot(&self, id: SlotId) -> bool;
    fn has_slot(&self, id: SlotId) -> bool;
}

/// Handle to one subscription.
///
/// Cloning the handle does not duplicate the subscription; any clone can
/// disconnect it.
#[derive(Clone)]
pub struct Connection {
    id: SlotId,
    table: Weak<dyn SlotTable>,
}

impl Connection {
    pub(crate) fn new(id: SlotId, table: Weak<dyn SlotTable>) -> Self {
        Self { id, table }
    }

    /// The subscription's ID.
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Remove the subscriber from its signal.
    ///
    /// Returns `false` when it was already gone (disconnected earlier, or
    /// the signal itself was dropped).
    pub fn disconnect(&self) -> bool {
        match self.table.upgrade() {
            Some(table) => table.remove_slot(self.id),
            None => false,
        }
    }

    /// Whether the subscriber is still registered.
    pub fn is_connected(&self) -> bool {
        self.table
            .upgrade()
            .is_some_and(|table| table.has_slot(self.id))
    }

    /// Tie the subscription to the returned guard's lifetime.
    pub fn scoped(self) -> ScopedConnection {
        ScopedConnection { inner: Some(self) }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// RAII guard that disconnects its subscription when dropped.
#[must_use = "dropping a ScopedConnection disconnects it immediately"]
pub struct ScopedConnection {
    inner: Option<Connection>,
}

impl ScopedConnection {
    /// Give up the scoping and return the plain connection.
    pub fn release(mut self) -> Connection {
        // `inner` is only ever taken here or in Drop.
        match self.inner.take() {
            Some(connection) => connection,
            None => unreachable!("scoped connection released twice"),
        }
    }

    /// Whether the subscriber is still registered.
    pub fn is_connected(&self) -> bool {
        self.inner.as_ref().is_some_and(Connection::is_connected)
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.inner.take() {
            connection.disconnect();
        }
    }
}

impl fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("inner", &self.inner)
            .finish()
    }
}
