//! # Typed Entity Identifiers
//!
//! `EntityId<E>` wraps an entity's key together with the entity type itself,
//! so an id for one entity kind can never be handed to a repository of
//! another kind. The phantom parameter exists only at compile time; at
//! runtime an `EntityId<E>` is exactly its key.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::traits::Entity;

/// Identifier for one entity of kind `E`
///
/// Two ids are equal exactly when they identify the same entity kind and
/// carry equal keys. Ids of different entity kinds are different Rust types
/// and cannot be compared at all.
pub struct EntityId<E: Entity> {
    key: E::Key,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityId<E> {
    /// Create an id for entity kind `E` from its key
    pub fn of(key: impl Into<E::Key>) -> Self {
        Self {
            key: key.into(),
            _entity: PhantomData,
        }
    }

    /// Borrow the underlying key
    pub fn key(&self) -> &E::Key {
        &self.key
    }

    /// Take the underlying key
    pub fn into_key(self) -> E::Key {
        self.key
    }
}

impl<E: Entity> Clone for EntityId<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PartialEq for EntityId<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<E: Entity> Eq for EntityId<E> {}

impl<E: Entity> Hash for EntityId<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<E: Entity> fmt::Debug for EntityId<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity = std::any::type_name::<E>().rsplit("::").next().unwrap_or("?");
        write!(f, "EntityId<{entity}>({:?})", self.key)
    }
}

impl<E: Entity> fmt::Display for EntityId<E>
where
    E::Key: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

impl<E: Entity> Serialize for EntityId<E>
where
    E::Key: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.key.serialize(serializer)
    }
}

impl<'de, E: Entity> Deserialize<'de> for EntityId<E>
where
    E::Key: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        E::Key::deserialize(deserializer).map(Self::of)
    }
}
