//! # Queryable Sources and Erased Callbacks
//!
//! A [`Queryable<T>`] is a typed handle over a payload only its backend
//! understands. The forwarding layer never looks inside; it hands the raw
//! payload back to the installed executor together with type-erased
//! callbacks built from the caller's closures. Erasure failures are typed
//! errors, never panics.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::QueryError;

/// A value returned by a backend with its type erased
pub type ErasedValue = Box<dyn Any + Send>;

/// Backend-owned payload behind a [`Queryable<T>`]
///
/// Backends create it around their own source representation and downcast
/// it back when an executor method is invoked. Cloning shares the payload.
#[derive(Clone)]
pub struct RawQueryable {
    payload: Arc<dyn Any + Send + Sync>,
}

impl RawQueryable {
    /// Wrap a backend source representation
    pub fn new(payload: impl Any + Send + Sync) -> Self {
        Self {
            payload: Arc::new(payload),
        }
    }

    /// Recover the backend source representation
    ///
    /// Fails with [`QueryError::SourceMismatch`] when the payload was
    /// created by a different backend.
    pub fn downcast_ref<S: 'static>(&self) -> Result<&S, QueryError> {
        self.payload
            .downcast_ref::<S>()
            .ok_or_else(|| QueryError::source_mismatch::<S>())
    }
}

impl fmt::Debug for RawQueryable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawQueryable")
    }
}

/// Typed handle to a backend-defined sequence of `T`
///
/// Produced by backends (for example when a repository materializes an
/// async query source) and consumed through the sequence operations in
/// [`crate::executor::proxy`]. Cloning is cheap and shares the payload, so
/// one source can serve several operations.
pub struct Queryable<T> {
    raw: RawQueryable,
    _item: PhantomData<fn() -> T>,
}

impl<T> Queryable<T> {
    /// Wrap a backend payload into a typed handle
    pub fn new(payload: impl Any + Send + Sync) -> Self {
        Self::from_raw(RawQueryable::new(payload))
    }

    /// Type a raw payload
    pub fn from_raw(raw: RawQueryable) -> Self {
        Self {
            raw,
            _item: PhantomData,
        }
    }

    /// Strip the item type off, keeping the payload
    pub fn into_raw(self) -> RawQueryable {
        self.raw
    }

    /// Borrow the raw payload
    pub fn raw(&self) -> &RawQueryable {
        &self.raw
    }
}

impl<T> Clone for Queryable<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _item: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Queryable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queryable<{}>", std::any::type_name::<T>())
    }
}

/// Type-erased predicate over sequence items
pub struct Predicate {
    test: Box<dyn Fn(&dyn Any) -> Result<bool, QueryError> + Send + Sync>,
}

impl Predicate {
    /// Erase a typed predicate
    pub fn of<T, F>(f: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Box::new(move |item| {
                let item = item
                    .downcast_ref::<T>()
                    .ok_or_else(|| QueryError::item_mismatch::<T>())?;
                Ok(f(item))
            }),
        }
    }

    /// Apply the predicate to an erased item
    pub fn test(&self, item: &dyn Any) -> Result<bool, QueryError> {
        (self.test)(item)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

/// Type-erased projection of an item to a numeric value
pub struct Selector<N> {
    select: Box<dyn Fn(&dyn Any) -> Result<N, QueryError> + Send + Sync>,
}

impl<N: 'static> Selector<N> {
    /// Erase a typed projection
    pub fn of<T, F>(f: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> N + Send + Sync + 'static,
    {
        Self {
            select: Box::new(move |item| {
                let item = item
                    .downcast_ref::<T>()
                    .ok_or_else(|| QueryError::item_mismatch::<T>())?;
                Ok(f(item))
            }),
        }
    }

    /// Apply the projection to an erased item
    pub fn select(&self, item: &dyn Any) -> Result<N, QueryError> {
        (self.select)(item)
    }
}

impl<N> fmt::Debug for Selector<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector<{}>", std::any::type_name::<N>())
    }
}

/// Type-erased projection of an item to an orderable key
pub struct KeyFn {
    apply: Box<dyn Fn(&dyn Any) -> Result<ErasedValue, QueryError> + Send + Sync>,
}

impl KeyFn {
    /// Erase a typed key projection
    pub fn of<T, K, F>(f: F) -> Self
    where
        T: 'static,
        K: Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            apply: Box::new(move |item| {
                let item = item
                    .downcast_ref::<T>()
                    .ok_or_else(|| QueryError::item_mismatch::<T>())?;
                Ok(Box::new(f(item)) as ErasedValue)
            }),
        }
    }

    /// Project an erased item to its erased key
    pub fn apply(&self, item: &dyn Any) -> Result<ErasedValue, QueryError> {
        (self.apply)(item)
    }
}

impl fmt::Debug for KeyFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyFn")
    }
}

/// Type-erased total order over erased values of one concrete type
pub struct Comparator {
    compare: Box<dyn Fn(&dyn Any, &dyn Any) -> Result<Ordering, QueryError> + Send + Sync>,
}

impl Comparator {
    /// Total order derived from `T: Ord`
    pub fn of<T: Ord + 'static>() -> Self {
        Self {
            compare: Box::new(|left, right| {
                let left = left
                    .downcast_ref::<T>()
                    .ok_or_else(|| QueryError::item_mismatch::<T>())?;
                let right = right
                    .downcast_ref::<T>()
                    .ok_or_else(|| QueryError::item_mismatch::<T>())?;
                Ok(left.cmp(right))
            }),
        }
    }

    /// Compare two erased values
    pub fn compare(&self, left: &dyn Any, right: &dyn Any) -> Result<Ordering, QueryError> {
        (self.compare)(left, right)
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator")
    }
}

/// Type-erased membership probe carrying the sought value
pub struct Matcher {
    matches: Box<dyn Fn(&dyn Any) -> Result<bool, QueryError> + Send + Sync>,
}

impl Matcher {
    /// Probe for items equal to `needle`
    pub fn equals<T>(needle: T) -> Self
    where
        T: PartialEq + Send + Sync + 'static,
    {
        Self {
            matches: Box::new(move |item| {
                let item = item
                    .downcast_ref::<T>()
                    .ok_or_else(|| QueryError::item_mismatch::<T>())?;
                Ok(*item == needle)
            }),
        }
    }

    /// Test an erased item against the probe
    pub fn matches(&self, item: &dyn Any) -> Result<bool, QueryError> {
        (self.matches)(item)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matcher")
    }
}

/// Decode an erased backend return into its concrete type
pub fn decode<T: 'static>(value: ErasedValue) -> Result<T, QueryError> {
    value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        QueryError::ResultMismatch {
            expected: std::any::type_name::<T>(),
        }
    })
}

/// Decode an optional erased return
pub fn decode_opt<T: 'static>(value: Option<ErasedValue>) -> Result<Option<T>, QueryError> {
    value.map(decode).transpose()
}

/// Decode a materialized erased sequence
pub fn decode_vec<T: 'static>(values: Vec<ErasedValue>) -> Result<Vec<T>, QueryError> {
    values.into_iter().map(decode).collect()
}
