//! # Query Builder
//!
//! Factory for the common query shapes so applications rarely implement
//! the query traits by hand: lookup by id, filter by predicate, or an
//! arbitrary computation over the source. Built queries start non-read-only
//! with no includes; both can be adjusted with the `with_` methods before
//! handing the query to a repository.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::include::Include;
use super::traits::{Query, QueryAsync};
use crate::entity::{Entity, EntityId};
use crate::error::QueryError;
use crate::executor::Queryable;

type SyncRun<E, R> =
    Box<dyn Fn(&mut dyn Iterator<Item = E>) -> Result<R, QueryError> + Send + Sync>;
type AsyncRun<E, R> =
    Box<dyn Fn(Queryable<E>) -> BoxFuture<'static, Result<R, QueryError>> + Send + Sync>;

/// Factory for built-in query shapes
pub struct QueryBuilder;

impl QueryBuilder {
    /// Query the entity carrying `id`
    ///
    /// Resolves to `None` when no entity matches; more than one match is a
    /// [`QueryError::MultipleElements`] failure.
    pub fn by_id<E: Entity>(id: EntityId<E>) -> BuiltQuery<E, Option<E>> {
        BuiltQuery::new(Box::new(move |items| {
            let mut matched = items.filter(|e| e.id() == id.key());
            match (matched.next(), matched.next()) {
                (Some(entity), None) => Ok(Some(entity)),
                (Some(_), Some(_)) => Err(QueryError::MultipleElements),
                (None, _) => Ok(None),
            }
        }))
    }

    /// Async query for the entity carrying `id`
    pub fn by_id_async<E: Entity>(id: EntityId<E>) -> BuiltQueryAsync<E, Option<E>> {
        BuiltQueryAsync::new(Box::new(move |source| {
            let id = id.clone();
            Box::pin(async move { source.single_opt_where(move |e: &E| e.id() == id.key()).await })
        }))
    }

    /// Query all entities satisfying `predicate`
    pub fn matching<E, F>(predicate: F) -> BuiltQuery<E, Vec<E>>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        BuiltQuery::new(Box::new(move |items| {
            Ok(items.filter(|e| predicate(e)).collect())
        }))
    }

    /// Async query for all entities satisfying `predicate`
    pub fn matching_async<E, F>(predicate: F) -> BuiltQueryAsync<E, Vec<E>>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        BuiltQueryAsync::new(Box::new(move |source| {
            let predicate = Arc::clone(&predicate);
            Box::pin(async move { source.to_vec_where(move |e: &E| predicate(e)).await })
        }))
    }

    /// Query computing an arbitrary result from the source
    pub fn from_fn<E, R, F>(run: F) -> BuiltQuery<E, R>
    where
        E: Entity,
        F: Fn(&mut dyn Iterator<Item = E>) -> Result<R, QueryError> + Send + Sync + 'static,
    {
        BuiltQuery::new(Box::new(run))
    }

    /// Async query computing an arbitrary result from the source
    pub fn from_fn_async<E, R, F>(run: F) -> BuiltQueryAsync<E, R>
    where
        E: Entity,
        F: Fn(Queryable<E>) -> BoxFuture<'static, Result<R, QueryError>> + Send + Sync + 'static,
    {
        BuiltQueryAsync::new(Box::new(run))
    }
}

/// Sync query assembled by [`QueryBuilder`]
pub struct BuiltQuery<E: Entity, R> {
    read_only: bool,
    includes: Vec<Include<E>>,
    run: SyncRun<E, R>,
}

impl<E: Entity, R> BuiltQuery<E, R> {
    fn new(run: SyncRun<E, R>) -> Self {
        Self {
            read_only: false,
            includes: Vec::new(),
            run,
        }
    }

    /// Mark the query read-only (or not)
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Append an include hint; hints keep the order they were added in
    pub fn with_include(mut self, include: impl Into<Include<E>>) -> Self {
        self.includes.push(include.into());
        self
    }
}

impl<E: Entity, R> Query<E, R> for BuiltQuery<E, R> {
    fn read_only(&self) -> bool {
        self.read_only
    }

    fn includes(&self) -> &[Include<E>] {
        &self.includes
    }

    fn execute(&self, items: &mut dyn Iterator<Item = E>) -> Result<R, QueryError> {
        (self.run)(items)
    }
}

/// Async query assembled by [`QueryBuilder`]
pub struct BuiltQueryAsync<E: Entity, R> {
    read_only: bool,
    includes: Vec<Include<E>>,
    run: AsyncRun<E, R>,
}

impl<E: Entity, R> BuiltQueryAsync<E, R> {
    fn new(run: AsyncRun<E, R>) -> Self {
        Self {
            read_only: false,
            includes: Vec::new(),
            run,
        }
    }

    /// Mark the query read-only (or not)
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Append an include hint; hints keep the order they were added in
    pub fn with_include(mut self, include: impl Into<Include<E>>) -> Self {
        self.includes.push(include.into());
        self
    }
}

#[async_trait]
impl<E: Entity, R: Send + 'static> QueryAsync<E, R> for BuiltQueryAsync<E, R> {
    fn read_only(&self) -> bool {
        self.read_only
    }

    fn includes(&self) -> &[Include<E>] {
        &self.includes
    }

    async fn execute(&self, source: Queryable<E>) -> Result<R, QueryError> {
        (self.run)(source).await
    }
}
