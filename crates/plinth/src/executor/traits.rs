//! # Query Executor Contract
//!
//! The backend interface behind every async sequence operation. One
//! installed [`QueryExecutor`] serves all entity and element types, so the
//! trait is deliberately monomorphic: sources arrive as [`RawQueryable`]
//! payloads, callers' closures arrive as erased callbacks, and element
//! results leave as [`ErasedValue`]s. The numeric grid is spelled out per
//! primitive type (plain and optional) to keep the trait object-safe; the
//! typed layer in [`super::proxy`] bridges generics onto it.
//!
//! Backends receive every cancellation token untouched. Whether and how a
//! token is honored is backend policy.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::source::{Comparator, ErasedValue, KeyFn, Matcher, Predicate, RawQueryable, Selector};
use crate::error::QueryError;

/// Backend executing async sequence operations over queryable sources
///
/// Implementations must uphold the sequence conditions of the contract:
/// `first*`/`single*`/`min*`/`max*` and non-optional averages fail with
/// [`QueryError::NoElements`] on empty sources, `single*` fails with
/// [`QueryError::MultipleElements`] when more than one item matches, and
/// the optional variants return `Ok(None)` instead of `NoElements`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Whether every item satisfies the predicate
    async fn all(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<bool, QueryError>;

    /// Whether the sequence has any items
    async fn any(&self, source: RawQueryable, token: CancellationToken)
        -> Result<bool, QueryError>;

    /// Whether any item satisfies the predicate
    async fn any_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<bool, QueryError>;

    /// Whether the sequence contains the probed value
    async fn contains(
        &self,
        source: RawQueryable,
        probe: Matcher,
        token: CancellationToken,
    ) -> Result<bool, QueryError>;

    /// Number of items
    async fn count(&self, source: RawQueryable, token: CancellationToken)
        -> Result<u64, QueryError>;

    /// Number of items satisfying the predicate
    async fn count_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<u64, QueryError>;

    /// First item
    async fn first(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// First item satisfying the predicate
    async fn first_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// First item, or `None` when empty
    async fn first_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError>;

    /// First item satisfying the predicate, or `None` when nothing matches
    async fn first_opt_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError>;

    /// The only item
    async fn single(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// The only item satisfying the predicate
    async fn single_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// The only item, or `None` when empty
    async fn single_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError>;

    /// The only item satisfying the predicate, or `None` when nothing matches
    async fn single_opt_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError>;

    /// Smallest item under the comparator
    async fn min(
        &self,
        source: RawQueryable,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// Smallest projected key under the comparator
    async fn min_by(
        &self,
        source: RawQueryable,
        key: KeyFn,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// Largest item under the comparator
    async fn max(
        &self,
        source: RawQueryable,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// Largest projected key under the comparator
    async fn max_by(
        &self,
        source: RawQueryable,
        key: KeyFn,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError>;

    /// Sum of an `i32` sequence
    async fn sum_i32(&self, source: RawQueryable, token: CancellationToken)
        -> Result<i32, QueryError>;

    /// Sum of an `Option<i32>` sequence, skipping `None` items
    async fn sum_i32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<i32>, QueryError>;

    /// Sum of an `i32` projection
    async fn sum_i32_by(
        &self,
        source: RawQueryable,
        selector: Selector<i32>,
        token: CancellationToken,
    ) -> Result<i32, QueryError>;

    /// Sum of an `Option<i32>` projection, skipping `None` values
    async fn sum_i32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i32>>,
        token: CancellationToken,
    ) -> Result<Option<i32>, QueryError>;

    /// Sum of an `i64` sequence
    async fn sum_i64(&self, source: RawQueryable, token: CancellationToken)
        -> Result<i64, QueryError>;

    /// Sum of an `Option<i64>` sequence, skipping `None` items
    async fn sum_i64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<i64>, QueryError>;

    /// Sum of an `i64` projection
    async fn sum_i64_by(
        &self,
        source: RawQueryable,
        selector: Selector<i64>,
        token: CancellationToken,
    ) -> Result<i64, QueryError>;

    /// Sum of an `Option<i64>` projection, skipping `None` values
    async fn sum_i64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i64>>,
        token: CancellationToken,
    ) -> Result<Option<i64>, QueryError>;

    /// Sum of an `f32` sequence
    async fn sum_f32(&self, source: RawQueryable, token: CancellationToken)
        -> Result<f32, QueryError>;

    /// Sum of an `Option<f32>` sequence, skipping `None` items
    async fn sum_f32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError>;

    /// Sum of an `f32` projection
    async fn sum_f32_by(
        &self,
        source: RawQueryable,
        selector: Selector<f32>,
        token: CancellationToken,
    ) -> Result<f32, QueryError>;

    /// Sum of an `Option<f32>` projection, skipping `None` values
    async fn sum_f32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f32>>,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError>;

    /// Sum of an `f64` sequence
    async fn sum_f64(&self, source: RawQueryable, token: CancellationToken)
        -> Result<f64, QueryError>;

    /// Sum of an `Option<f64>` sequence, skipping `None` items
    async fn sum_f64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Sum of an `f64` projection
    async fn sum_f64_by(
        &self,
        source: RawQueryable,
        selector: Selector<f64>,
        token: CancellationToken,
    ) -> Result<f64, QueryError>;

    /// Sum of an `Option<f64>` projection, skipping `None` values
    async fn sum_f64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f64>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Average of an `i32` sequence
    async fn avg_i32(&self, source: RawQueryable, token: CancellationToken)
        -> Result<f64, QueryError>;

    /// Average of the present items of an `Option<i32>` sequence
    async fn avg_i32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Average of an `i32` projection
    async fn avg_i32_by(
        &self,
        source: RawQueryable,
        selector: Selector<i32>,
        token: CancellationToken,
    ) -> Result<f64, QueryError>;

    /// Average of the present values of an `Option<i32>` projection
    async fn avg_i32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i32>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Average of an `i64` sequence
    async fn avg_i64(&self, source: RawQueryable, token: CancellationToken)
        -> Result<f64, QueryError>;

    /// Average of the present items of an `Option<i64>` sequence
    async fn avg_i64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Average of an `i64` projection
    async fn avg_i64_by(
        &self,
        source: RawQueryable,
        selector: Selector<i64>,
        token: CancellationToken,
    ) -> Result<f64, QueryError>;

    /// Average of the present values of an `Option<i64>` projection
    async fn avg_i64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i64>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Average of an `f32` sequence
    async fn avg_f32(&self, source: RawQueryable, token: CancellationToken)
        -> Result<f32, QueryError>;

    /// Average of the present items of an `Option<f32>` sequence
    async fn avg_f32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError>;

    /// Average of an `f32` projection
    async fn avg_f32_by(
        &self,
        source: RawQueryable,
        selector: Selector<f32>,
        token: CancellationToken,
    ) -> Result<f32, QueryError>;

    /// Average of the present values of an `Option<f32>` projection
    async fn avg_f32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f32>>,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError>;

    /// Average of an `f64` sequence
    async fn avg_f64(&self, source: RawQueryable, token: CancellationToken)
        -> Result<f64, QueryError>;

    /// Average of the present items of an `Option<f64>` sequence
    async fn avg_f64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Average of an `f64` projection
    async fn avg_f64_by(
        &self,
        source: RawQueryable,
        selector: Selector<f64>,
        token: CancellationToken,
    ) -> Result<f64, QueryError>;

    /// Average of the present values of an `Option<f64>` projection
    async fn avg_f64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f64>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError>;

    /// Materialize the sequence
    async fn to_vec(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Vec<ErasedValue>, QueryError>;

    /// Materialize the items satisfying the predicate
    async fn to_vec_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<Vec<ErasedValue>, QueryError>;
}
