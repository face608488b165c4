//! Observable Core
//!
//! This crate composes observable wrappers around plain data models. A
//! mutation made through a wrapper changes the model first and then
//! notifies every enclosing level, from the mutated leaf up to the root,
//! without the model types knowing anything about observation.
//!
//! It implements:
//!
//! - Value, container, variant and class adapters
//! - Bottom-up change propagation through nested adapters
//! - Transactions that coalesce member notifications
//! - Shared, lazily created element adapters
//! - JSON and MessagePack archives routed through the adapters
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `signal`: Multi-subscriber broadcasting and connection handles
//! - `place`: Addressing a fragment of a shared model
//! - `observable`: The adapter traits, `Value`, `Variant`, `Class` and
//!   transactions
//! - `container`: `Vector`, `Map`, `UnorderedMap`, `UnorderedSet` and the
//!   element cache
//! - `registry`: One shared adapter per model
//! - `archive`: Serialization helpers
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use observable_core::container::Vector;
//!
//! let names = Vector::new(vec!["abc".to_string()]);
//! let changes = Rc::new(Cell::new(0));
//!
//! let counter = Rc::clone(&changes);
//! names.on_change(move |_| counter.set(counter.get() + 1));
//!
//! names.push("def".to_string());
//! names.element(0).unwrap().set("xyz".to_string());
//!
//! assert_eq!(changes.get(), 2);
//! assert_eq!(*names.model(), vec!["xyz", "def"]);
//! ```

pub mod archive;
pub mod container;
pub mod error;
pub mod observable;
pub mod place;
pub mod registry;
pub mod signal;

pub use error::{ObservableError, Result};
pub use observable::{observe, observe_as, Adapter, Class, Observe, Transaction, Value, Variant};
pub use registry::observe_shared;
