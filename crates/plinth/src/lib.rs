//! # Plinth
//!
//! Persistence abstractions for repository-pattern data access. This crate
//! provides the contracts application code programs against and the typed
//! async query surface backends implement behind them.
//!
//! ## Key Features
//! - Phantom-typed entity identifiers (`EntityId<E>`) that never mix across
//!   entity types
//! - Repository and unit-of-work contracts over any backend
//! - Query objects (sync and async) carrying read-only hints and ordered
//!   eager-load include paths
//! - A typed async sequence surface (`Queryable<T>`) forwarded verbatim to
//!   one process-wide `QueryExecutor`
//! - An in-memory reference backend for tests and local development
//!
//! ## Design Principles
//! - Backends are swappable: application code sees traits, never a driver
//! - Strong typing with erasure only at the executor boundary
//! - Sequence conditions (empty, more than one element) are typed errors,
//!   never panics
//! - Serde support on identifiers and configuration for transport and files

pub mod config;
pub mod entity;
pub mod error;
pub mod executor;
pub mod memory;
pub mod query;
pub mod repository;
pub mod telemetry;

// Re-export commonly used types at the crate root for convenience
pub use config::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use query::*;
pub use repository::*;

// Re-export the reference backend directly
pub use memory::{MemoryExecutor, MemorySequence, MemoryStore, MemoryUnitOfWork};

/// Version of the plinth crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(VERSION.chars().any(|c| c.is_ascii_digit()));
    }
}
