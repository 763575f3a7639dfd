//! # In-Memory Store
//!
//! Reference repository and unit of work over a process-local map. Writes
//! stage into a pending buffer shared between a [`MemoryStore`] and the
//! [`MemoryUnitOfWork`] it hands out; commit validates and applies the
//! buffer in staging order against the committed map, rollback discards
//! it. Reads only ever see committed state.
//!
//! Include hints and the read-only flag have no effect here beyond a
//! debug log line; there is nothing to eager-load or change-track in a
//! map of owned values.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::executor::MemorySequence;
use crate::entity::{Entity, EntityId};
use crate::error::StoreError;
use crate::executor::Queryable;
use crate::query::{Include, Query, QueryAsync};
use crate::repository::{Repository, UnitOfWork};

enum PendingOp<E: Entity> {
    Add(E),
    Update(E),
    Delete(E::Key),
}

struct MemoryState<E: Entity> {
    committed: RwLock<HashMap<E::Key, E>>,
    pending: RwLock<Vec<PendingOp<E>>>,
}

impl<E: Entity + Clone> MemoryState<E> {
    fn apply_pending(&self) -> Result<usize, StoreError> {
        let mut pending = self.pending.write().unwrap();
        let mut next = self.committed.read().unwrap().clone();
        for op in pending.iter() {
            match op {
                PendingOp::Add(entity) => {
                    if next.contains_key(entity.id()) {
                        return Err(StoreError::DuplicateKey {
                            key: format!("{:?}", entity.id()),
                        });
                    }
                    next.insert(entity.id().clone(), entity.clone());
                }
                PendingOp::Update(entity) => {
                    if !next.contains_key(entity.id()) {
                        return Err(StoreError::MissingKey {
                            key: format!("{:?}", entity.id()),
                        });
                    }
                    next.insert(entity.id().clone(), entity.clone());
                }
                PendingOp::Delete(key) => {
                    next.remove(key);
                }
            }
        }
        let applied = pending.len();
        pending.clear();
        *self.committed.write().unwrap() = next;
        Ok(applied)
    }
}

/// In-memory repository for entity kind `E`
///
/// Cloning the store (or calling [`MemoryStore::unit_of_work`]) shares the
/// underlying state, so one logical store can be handed to several owners.
pub struct MemoryStore<E: Entity> {
    state: Arc<MemoryState<E>>,
}

impl<E: Entity + Clone> MemoryStore<E> {
    /// Empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState {
                committed: RwLock::new(HashMap::new()),
                pending: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Store seeded with already-committed entities
    pub fn with_entities(entities: impl IntoIterator<Item = E>) -> Self {
        let store = Self::new();
        {
            let mut committed = store.state.committed.write().unwrap();
            for entity in entities {
                committed.insert(entity.id().clone(), entity);
            }
        }
        store
    }

    /// Unit of work sharing this store's staged state
    pub fn unit_of_work(&self) -> MemoryUnitOfWork<E> {
        MemoryUnitOfWork {
            state: Arc::clone(&self.state),
        }
    }

    fn snapshot(&self) -> Vec<E> {
        self.state
            .committed
            .read()
            .unwrap()
            .values()
            .cloned()
            .collect()
    }
}

impl<E: Entity + Clone> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

fn log_includes<E: Entity>(includes: &[Include<E>]) {
    if !includes.is_empty() {
        debug!(
            ?includes,
            "include hints are not applicable to the in-memory store"
        );
    }
}

#[async_trait]
impl<E: Entity + Clone> Repository<E> for MemoryStore<E> {
    type Error = StoreError;

    fn find(&self, id: &EntityId<E>) -> Result<Option<E>, StoreError> {
        Ok(self.state.committed.read().unwrap().get(id.key()).cloned())
    }

    async fn find_async(&self, id: &EntityId<E>) -> Result<Option<E>, StoreError> {
        self.find(id)
    }

    fn add(&self, entity: E) -> Result<(), StoreError> {
        self.state
            .pending
            .write()
            .unwrap()
            .push(PendingOp::Add(entity));
        Ok(())
    }

    fn update(&self, entity: E) -> Result<(), StoreError> {
        self.state
            .pending
            .write()
            .unwrap()
            .push(PendingOp::Update(entity));
        Ok(())
    }

    fn delete(&self, entity: &E) -> Result<(), StoreError> {
        self.state
            .pending
            .write()
            .unwrap()
            .push(PendingOp::Delete(entity.id().clone()));
        Ok(())
    }

    fn get_by<R>(&self, query: &dyn Query<E, R>) -> Result<R, StoreError> {
        log_includes(query.includes());
        let mut items = self.snapshot().into_iter();
        Ok(query.execute(&mut items)?)
    }

    async fn get_by_async<R: Send + 'static>(
        &self,
        query: &dyn QueryAsync<E, R>,
    ) -> Result<R, StoreError> {
        log_includes(query.includes());
        let source = Queryable::new(MemorySequence::of(self.snapshot()));
        Ok(query.execute(source).await?)
    }
}

/// Unit of work over the staged state of a [`MemoryStore`]
pub struct MemoryUnitOfWork<E: Entity> {
    state: Arc<MemoryState<E>>,
}

impl<E: Entity> Clone for MemoryUnitOfWork<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl<E: Entity + Clone> UnitOfWork for MemoryUnitOfWork<E> {
    type Error = StoreError;

    fn commit(&self) -> Result<(), StoreError> {
        let applied = self.state.apply_pending()?;
        debug!(applied, "committed staged work");
        Ok(())
    }

    async fn commit_async(&self) -> Result<(), StoreError> {
        self.commit()
    }

    fn rollback(&self) -> Result<(), StoreError> {
        let mut pending = self.state.pending.write().unwrap();
        let discarded = pending.len();
        pending.clear();
        debug!(discarded, "discarded staged work");
        Ok(())
    }
}
