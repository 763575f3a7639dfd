//! # In-Memory Reference Backend
//!
//! A complete backend for tests and local development: a repository and
//! unit of work over a process-local map, plus an executor computing every
//! sequence operation over snapshot payloads. Install the executor once
//! with [`crate::executor::initialize`] and every store in the process can
//! serve async queries.

pub mod executor;
pub mod store;

pub use executor::{ErasedItem, MemoryExecutor, MemorySequence};
pub use store::{MemoryStore, MemoryUnitOfWork};
