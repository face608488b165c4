//! Signals and Connections
//!
//! Every observable wrapper exposes its notifications as [`Signal`]s. A
//! signal is a plain, synchronous observer list: connecting returns a
//! [`Connection`], emitting calls each subscriber in subscription order
//! before returning.
//!
//! # Lifetimes
//!
//! A signal owns its subscribers. Dropping the wrapper that owns a signal
//! drops every callback connected to it, and any [`Connection`] still held
//! elsewhere reports itself as disconnected. A [`ScopedConnection`]
//! disconnects when it goes out of scope.

mod broadcast;
mod connection;

pub use broadcast::Signal;
pub use connection::{Connection, ScopedConnection, SlotId};
