//! # Entity Contract
//!
//! The trait every persistable domain type implements so repositories and
//! query builders can reason about its key.

use std::fmt::Debug;
use std::hash::Hash;

/// Contract for persistable domain entities
///
/// An entity is anything with a stable key a repository can file it under.
/// The key is readable and replaceable: backends that generate keys on
/// insert write the generated value back through [`Entity::set_id`].
pub trait Entity: Send + Sync + 'static {
    /// Key type identifying one entity of this kind
    ///
    /// `String`, `i32`, `i64` and `uuid::Uuid` are the common choices; any
    /// type satisfying the bounds works.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Current key of this entity
    fn id(&self) -> &Self::Key;

    /// Replace the key of this entity
    fn set_id(&mut self, key: Self::Key);
}
