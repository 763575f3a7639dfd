//! # Entity Model
//!
//! The entity contract and the typed identifiers shared by repositories,
//! queries and backends.

pub mod id;
pub mod traits;

pub use id::EntityId;
pub use traits::Entity;
