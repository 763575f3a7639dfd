//! # Related-Data Includes
//!
//! An [`Include`] names related data a backend should load together with
//! the queried entities, addressed by a navigation path the backend
//! understands (for example `"orders"` or `"orders.lines"`). Includes are
//! typed to their entity kind so a query for one kind cannot carry hints
//! meant for another.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Eager-loading hint for entity kind `E`
pub struct Include<E> {
    path: Cow<'static, str>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Include<E> {
    /// Hint at the relation reachable under `path`
    pub fn new(path: impl Into<Cow<'static, str>>) -> Self {
        Self {
            path: path.into(),
            _entity: PhantomData,
        }
    }

    /// Navigation path of the relation
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<E> Clone for Include<E> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> PartialEq for Include<E> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<E> Eq for Include<E> {}

impl<E> fmt::Debug for Include<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Include").field(&self.path).finish()
    }
}

impl<E> fmt::Display for Include<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl<E> From<&'static str> for Include<E> {
    fn from(path: &'static str) -> Self {
        Self::new(path)
    }
}

impl<E> From<String> for Include<E> {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl<E> Serialize for Include<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl<'de, E> Deserialize<'de> for Include<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
