//! # Query Model
//!
//! Query descriptions handed to repositories: the sync and async query
//! contracts, the typed include hints they carry, and a builder for the
//! common shapes.

pub mod builder;
pub mod include;
pub mod traits;

pub use builder::{BuiltQuery, BuiltQueryAsync, QueryBuilder};
pub use include::Include;
pub use traits::{Query, QueryAsync};
