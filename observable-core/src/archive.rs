//! Archive Support
//!
//! Saving reads the adapter's model directly. Loading never writes the
//! model behind the adapter's back: the decoded model is handed to
//! [`Restore::restore`], which replays it through the adapter's normal
//! mutating operations so subscribers, vetoes and element caches see a
//! regular sequence of changes.
//!
//! Two encodings are provided: JSON through `serde_json` and MessagePack
//! (with field names) through `rmp-serde`.

use std::collections::HashSet;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::container::{Associative, Keyed, UnorderedSet, Vector};
use crate::error::Result;
use crate::observable::{Adapter, Class, ClassModel, Observe, Value, Variant, VariantModel};

/// Replace an adapter's content with a decoded model.
pub trait Restore: Adapter {
    /// Route `model` through the adapter's mutating operations.
    ///
    /// Returns `false` if a `before_erase` subscriber refused to let the
    /// old content go; the adapter is unchanged then.
    fn restore(&self, model: Self::Model) -> bool;
}

impl<T: Clone + 'static> Restore for Value<T> {
    fn restore(&self, model: T) -> bool {
        self.set(model);
        true
    }
}

impl<E: VariantModel> Restore for Variant<E> {
    fn restore(&self, model: E) -> bool {
        self.set(model);
        true
    }
}

impl<M: ClassModel> Restore for Class<M> {
    fn restore(&self, model: M) -> bool {
        self.replace(model);
        true
    }
}

impl<T: Observe> Restore for Vector<T> {
    fn restore(&self, model: Vec<T>) -> bool {
        if !self.clear() {
            return false;
        }
        self.extend(model);
        true
    }
}

impl<C> Restore for Keyed<C>
where
    C: Associative + IntoIterator<Item = (<C as Associative>::Key, <C as Associative>::Value)>,
    C::Value: Observe,
{
    fn restore(&self, model: C) -> bool {
        if !self.clear() {
            return false;
        }
        self.extend(model);
        true
    }
}

impl<T: Hash + Eq + Clone + 'static> Restore for UnorderedSet<T> {
    fn restore(&self, model: HashSet<T>) -> bool {
        if !self.clear() {
            return false;
        }
        self.extend(model);
        true
    }
}

/// Encode the adapter's model as JSON.
pub fn to_json<A>(adapter: &A) -> Result<String>
where
    A: Adapter,
    A::Model: Serialize,
{
    Ok(serde_json::to_string(&*adapter.model())?)
}

/// Decode JSON into the adapter's model.
pub fn load_json<A>(adapter: &A, json: &str) -> Result<bool>
where
    A: Restore,
    A::Model: DeserializeOwned,
{
    let model = serde_json::from_str(json)?;
    debug!(bytes = json.len(), "loading json archive");
    Ok(adapter.restore(model))
}

/// Encode the adapter's model as MessagePack.
pub fn to_msgpack<A>(adapter: &A) -> Result<Vec<u8>>
where
    A: Adapter,
    A::Model: Serialize,
{
    Ok(rmp_serde::to_vec_named(&*adapter.model())?)
}

/// Decode MessagePack into the adapter's model.
pub fn load_msgpack<A>(adapter: &A, bytes: &[u8]) -> Result<bool>
where
    A: Restore,
    A::Model: DeserializeOwned,
{
    let model = rmp_serde::from_slice(bytes)?;
    debug!(bytes = bytes.len(), "loading msgpack archive");
    Ok(adapter.restore(model))
}
