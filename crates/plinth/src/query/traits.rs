//! # Query Contracts
//!
//! A query describes a read: whether it may skip change tracking, which
//! related data to load, and how to compute its result from the entity
//! source a repository supplies. The sync flavor runs against an iterator,
//! the async flavor against a [`Queryable`] source driven by the installed
//! executor.

use async_trait::async_trait;

use super::include::Include;
use crate::entity::Entity;
use crate::error::QueryError;
use crate::executor::Queryable;

/// A read-only flag plus ordered include hints, executed against an
/// in-memory iterator over entities
///
/// Repositories materialize their entity set, apply [`Query::includes`] in
/// declaration order where applicable, and hand the iterator to
/// [`Query::execute`].
pub trait Query<E: Entity, R>: Send + Sync {
    /// Whether the source may skip change tracking for this read
    fn read_only(&self) -> bool {
        false
    }

    /// Related data to load with the entities, in declaration order
    fn includes(&self) -> &[Include<E>] {
        &[]
    }

    /// Compute the result from the entity source
    fn execute(&self, items: &mut dyn Iterator<Item = E>) -> Result<R, QueryError>;
}

/// Async counterpart of [`Query`], executed against a [`Queryable`] source
///
/// Backends apply [`QueryAsync::includes`] in declaration order while
/// building the source, then invoke [`QueryAsync::execute`]. The sequence
/// operations available on the source forward to the globally installed
/// executor.
#[async_trait]
pub trait QueryAsync<E: Entity, R>: Send + Sync {
    /// Whether the source may skip change tracking for this read
    fn read_only(&self) -> bool {
        false
    }

    /// Related data to load with the entities, in declaration order
    fn includes(&self) -> &[Include<E>] {
        &[]
    }

    /// Compute the result from the queryable source
    async fn execute(&self, source: Queryable<E>) -> Result<R, QueryError>;
}
