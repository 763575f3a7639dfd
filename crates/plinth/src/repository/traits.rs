//! # Repository and Unit-of-Work Contracts
//!
//! Keyed access to entities plus the transactional boundary around it.
//! Repositories stage writes; the owning unit of work makes them visible
//! atomically on commit or discards them on rollback. Reads go through
//! typed ids or through the query contracts.

use async_trait::async_trait;

use crate::entity::{Entity, EntityId};
use crate::error::PlinthError;
use crate::query::{Query, QueryAsync};

/// Keyed access to one kind of entity
///
/// The `get_by` methods are generic over the query result, which keeps
/// this trait from being object-safe; repositories are used as concrete
/// types or behind generics, not as trait objects.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    type Error: PlinthError;

    /// Look up the entity carrying `id`
    fn find(&self, id: &EntityId<E>) -> Result<Option<E>, Self::Error>;

    /// Look up the entity carrying `id` without blocking the caller
    async fn find_async(&self, id: &EntityId<E>) -> Result<Option<E>, Self::Error>;

    /// Stage a new entity
    fn add(&self, entity: E) -> Result<(), Self::Error>;

    /// Stage changes to an existing entity
    fn update(&self, entity: E) -> Result<(), Self::Error>;

    /// Stage removal of an entity
    fn delete(&self, entity: &E) -> Result<(), Self::Error>;

    /// Run a sync query against this repository's entities
    fn get_by<R>(&self, query: &dyn Query<E, R>) -> Result<R, Self::Error>;

    /// Run an async query against this repository's entities
    async fn get_by_async<R: Send + 'static>(
        &self,
        query: &dyn QueryAsync<E, R>,
    ) -> Result<R, Self::Error>;
}

/// Transactional boundary around staged repository work
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Error: PlinthError;

    /// Apply all staged work atomically
    fn commit(&self) -> Result<(), Self::Error>;

    /// Apply all staged work without blocking the caller
    async fn commit_async(&self) -> Result<(), Self::Error>;

    /// Discard all staged work
    fn rollback(&self) -> Result<(), Self::Error>;
}
