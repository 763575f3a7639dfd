//! # Async Sequence Operations
//!
//! Everything behind the async query surface: the [`Queryable`] source
//! handle, the erased callback kit, the object-safe [`QueryExecutor`]
//! backend contract, the numeric aggregate families and the process-wide
//! proxy that forwards every typed operation to the installed backend.

pub mod aggregates;
pub mod proxy;
pub mod source;
pub mod traits;

pub use aggregates::{Averageable, Summable};
pub use proxy::{initialize, is_initialized};
pub use source::{
    decode, decode_opt, decode_vec, Comparator, ErasedValue, KeyFn, Matcher, Predicate, Queryable,
    RawQueryable, Selector,
};
pub use traits::QueryExecutor;
