//! # Sequence Operation Proxy
//!
//! The typed face of the executor contract. A process holds one installed
//! [`QueryExecutor`]; [`initialize`] installs it (the last call wins) and
//! every operation on [`Queryable<T>`] forwards to it, passing the source
//! payload, the caller's callbacks in erased form and the cancellation
//! token through untouched. The proxy performs no work of its own beyond
//! decoding erased results back to their concrete types.
//!
//! Every operation comes in two forms: the plain form passes a fresh token
//! that is never cancelled, the `_with` form passes the caller's token.

use std::sync::{Arc, RwLock};

use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::aggregates::{Averageable, Summable};
use super::source::{
    decode, decode_opt, decode_vec, Comparator, KeyFn, Matcher, Predicate, Queryable, Selector,
};
use super::traits::QueryExecutor;
use crate::error::QueryError;

static EXECUTOR: RwLock<Option<Arc<dyn QueryExecutor>>> = RwLock::new(None);

/// Install the process-wide query executor
///
/// All sequence operations in the process forward to this executor from
/// now on. Calling again replaces the previous executor; the last call
/// wins.
pub fn initialize(executor: Arc<dyn QueryExecutor>) {
    let mut slot = EXECUTOR.write().unwrap();
    let replaced = slot.is_some();
    *slot = Some(executor);
    counter!("plinth_executor_installs_total").increment(1);
    info!(replaced, "query executor installed");
}

/// Whether an executor is currently installed
pub fn is_initialized() -> bool {
    EXECUTOR.read().unwrap().is_some()
}

fn installed() -> Result<Arc<dyn QueryExecutor>, QueryError> {
    EXECUTOR
        .read()
        .unwrap()
        .as_ref()
        .cloned()
        .ok_or(QueryError::NotInitialized)
}

fn track(operation: &'static str) {
    counter!("plinth_query_operations_total", "operation" => operation).increment(1);
}

impl<T: Send + 'static> Queryable<T> {
    /// Whether every item satisfies `predicate`
    pub async fn all<F>(&self, predicate: F) -> Result<bool, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.all_with(predicate, CancellationToken::new()).await
    }

    /// Whether every item satisfies `predicate`, cancellable through `token`
    pub async fn all_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<bool, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("all");
        executor
            .all(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
            .await
    }

    /// Whether the sequence has any items
    pub async fn any(&self) -> Result<bool, QueryError> {
        self.any_with(CancellationToken::new()).await
    }

    /// Whether the sequence has any items, cancellable through `token`
    pub async fn any_with(&self, token: CancellationToken) -> Result<bool, QueryError> {
        let executor = installed()?;
        track("any");
        executor.any(self.raw().clone(), token).await
    }

    /// Whether any item satisfies `predicate`
    pub async fn any_where<F>(&self, predicate: F) -> Result<bool, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.any_where_with(predicate, CancellationToken::new()).await
    }

    /// Whether any item satisfies `predicate`, cancellable through `token`
    pub async fn any_where_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<bool, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("any_where");
        executor
            .any_where(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
            .await
    }

    /// Whether the sequence contains an item equal to `item`
    pub async fn contains(&self, item: T) -> Result<bool, QueryError>
    where
        T: PartialEq + Sync,
    {
        self.contains_with(item, CancellationToken::new()).await
    }

    /// Whether the sequence contains an item equal to `item`, cancellable
    /// through `token`
    pub async fn contains_with(&self, item: T, token: CancellationToken) -> Result<bool, QueryError>
    where
        T: PartialEq + Sync,
    {
        let executor = installed()?;
        track("contains");
        executor
            .contains(self.raw().clone(), Matcher::equals(item), token)
            .await
    }

    /// Number of items
    pub async fn count(&self) -> Result<u64, QueryError> {
        self.count_with(CancellationToken::new()).await
    }

    /// Number of items, cancellable through `token`
    pub async fn count_with(&self, token: CancellationToken) -> Result<u64, QueryError> {
        let executor = installed()?;
        track("count");
        executor.count(self.raw().clone(), token).await
    }

    /// Number of items satisfying `predicate`
    pub async fn count_where<F>(&self, predicate: F) -> Result<u64, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.count_where_with(predicate, CancellationToken::new()).await
    }

    /// Number of items satisfying `predicate`, cancellable through `token`
    pub async fn count_where_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<u64, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("count_where");
        executor
            .count_where(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
            .await
    }

    /// First item; fails with [`QueryError::NoElements`] when empty
    pub async fn first(&self) -> Result<T, QueryError> {
        self.first_with(CancellationToken::new()).await
    }

    /// First item, cancellable through `token`
    pub async fn first_with(&self, token: CancellationToken) -> Result<T, QueryError> {
        let executor = installed()?;
        track("first");
        decode(executor.first(self.raw().clone(), token).await?)
    }

    /// First item satisfying `predicate`
    pub async fn first_where<F>(&self, predicate: F) -> Result<T, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.first_where_with(predicate, CancellationToken::new()).await
    }

    /// First item satisfying `predicate`, cancellable through `token`
    pub async fn first_where_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<T, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("first_where");
        decode(
            executor
                .first_where(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
                .await?,
        )
    }

    /// First item, or `None` when empty
    pub async fn first_opt(&self) -> Result<Option<T>, QueryError> {
        self.first_opt_with(CancellationToken::new()).await
    }

    /// First item or `None`, cancellable through `token`
    pub async fn first_opt_with(&self, token: CancellationToken) -> Result<Option<T>, QueryError> {
        let executor = installed()?;
        track("first_opt");
        decode_opt(executor.first_opt(self.raw().clone(), token).await?)
    }

    /// First item satisfying `predicate`, or `None` when nothing matches
    pub async fn first_opt_where<F>(&self, predicate: F) -> Result<Option<T>, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.first_opt_where_with(predicate, CancellationToken::new()).await
    }

    /// First item satisfying `predicate` or `None`, cancellable through
    /// `token`
    pub async fn first_opt_where_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<Option<T>, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("first_opt_where");
        decode_opt(
            executor
                .first_opt_where(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
                .await?,
        )
    }

    /// The only item; fails when empty or when more than one is present
    pub async fn single(&self) -> Result<T, QueryError> {
        self.single_with(CancellationToken::new()).await
    }

    /// The only item, cancellable through `token`
    pub async fn single_with(&self, token: CancellationToken) -> Result<T, QueryError> {
        let executor = installed()?;
        track("single");
        decode(executor.single(self.raw().clone(), token).await?)
    }

    /// The only item satisfying `predicate`
    pub async fn single_where<F>(&self, predicate: F) -> Result<T, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.single_where_with(predicate, CancellationToken::new()).await
    }

    /// The only item satisfying `predicate`, cancellable through `token`
    pub async fn single_where_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<T, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("single_where");
        decode(
            executor
                .single_where(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
                .await?,
        )
    }

    /// The only item, or `None` when empty; more than one item is still an
    /// error
    pub async fn single_opt(&self) -> Result<Option<T>, QueryError> {
        self.single_opt_with(CancellationToken::new()).await
    }

    /// The only item or `None`, cancellable through `token`
    pub async fn single_opt_with(&self, token: CancellationToken) -> Result<Option<T>, QueryError> {
        let executor = installed()?;
        track("single_opt");
        decode_opt(executor.single_opt(self.raw().clone(), token).await?)
    }

    /// The only item satisfying `predicate`, or `None` when nothing matches
    pub async fn single_opt_where<F>(&self, predicate: F) -> Result<Option<T>, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.single_opt_where_with(predicate, CancellationToken::new()).await
    }

    /// The only item satisfying `predicate` or `None`, cancellable through
    /// `token`
    pub async fn single_opt_where_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<Option<T>, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("single_opt_where");
        decode_opt(
            executor
                .single_opt_where(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
                .await?,
        )
    }

    /// Smallest item
    pub async fn min(&self) -> Result<T, QueryError>
    where
        T: Ord,
    {
        self.min_with(CancellationToken::new()).await
    }

    /// Smallest item, cancellable through `token`
    pub async fn min_with(&self, token: CancellationToken) -> Result<T, QueryError>
    where
        T: Ord,
    {
        let executor = installed()?;
        track("min");
        decode(
            executor
                .min(self.raw().clone(), Comparator::of::<T>(), token)
                .await?,
        )
    }

    /// Smallest key produced by `key` over the sequence
    pub async fn min_by<K, F>(&self, key: F) -> Result<K, QueryError>
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.min_by_with(key, CancellationToken::new()).await
    }

    /// Smallest projected key, cancellable through `token`
    pub async fn min_by_with<K, F>(&self, key: F, token: CancellationToken) -> Result<K, QueryError>
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("min_by");
        decode(
            executor
                .min_by(
                    self.raw().clone(),
                    KeyFn::of::<T, K, _>(key),
                    Comparator::of::<K>(),
                    token,
                )
                .await?,
        )
    }

    /// Largest item
    pub async fn max(&self) -> Result<T, QueryError>
    where
        T: Ord,
    {
        self.max_with(CancellationToken::new()).await
    }

    /// Largest item, cancellable through `token`
    pub async fn max_with(&self, token: CancellationToken) -> Result<T, QueryError>
    where
        T: Ord,
    {
        let executor = installed()?;
        track("max");
        decode(
            executor
                .max(self.raw().clone(), Comparator::of::<T>(), token)
                .await?,
        )
    }

    /// Largest key produced by `key` over the sequence
    pub async fn max_by<K, F>(&self, key: F) -> Result<K, QueryError>
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.max_by_with(key, CancellationToken::new()).await
    }

    /// Largest projected key, cancellable through `token`
    pub async fn max_by_with<K, F>(&self, key: F, token: CancellationToken) -> Result<K, QueryError>
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("max_by");
        decode(
            executor
                .max_by(
                    self.raw().clone(),
                    KeyFn::of::<T, K, _>(key),
                    Comparator::of::<K>(),
                    token,
                )
                .await?,
        )
    }

    /// Sum of the sequence
    pub async fn sum(&self) -> Result<T::Output, QueryError>
    where
        T: Summable,
    {
        self.sum_with(CancellationToken::new()).await
    }

    /// Sum of the sequence, cancellable through `token`
    pub async fn sum_with(&self, token: CancellationToken) -> Result<T::Output, QueryError>
    where
        T: Summable,
    {
        let executor = installed()?;
        track("sum");
        T::dispatch_sum(&*executor, self.raw().clone(), token).await
    }

    /// Sum of a numeric projection of the sequence
    pub async fn sum_by<N, F>(&self, selector: F) -> Result<N::Output, QueryError>
    where
        N: Summable,
        F: Fn(&T) -> N + Send + Sync + 'static,
    {
        self.sum_by_with(selector, CancellationToken::new()).await
    }

    /// Sum of a numeric projection, cancellable through `token`
    pub async fn sum_by_with<N, F>(
        &self,
        selector: F,
        token: CancellationToken,
    ) -> Result<N::Output, QueryError>
    where
        N: Summable,
        F: Fn(&T) -> N + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("sum_by");
        N::dispatch_sum_by(
            &*executor,
            self.raw().clone(),
            Selector::of::<T, _>(selector),
            token,
        )
        .await
    }

    /// Average of the sequence
    pub async fn avg(&self) -> Result<T::Output, QueryError>
    where
        T: Averageable,
    {
        self.avg_with(CancellationToken::new()).await
    }

    /// Average of the sequence, cancellable through `token`
    pub async fn avg_with(&self, token: CancellationToken) -> Result<T::Output, QueryError>
    where
        T: Averageable,
    {
        let executor = installed()?;
        track("avg");
        T::dispatch_avg(&*executor, self.raw().clone(), token).await
    }

    /// Average of a numeric projection of the sequence
    pub async fn avg_by<N, F>(&self, selector: F) -> Result<N::Output, QueryError>
    where
        N: Averageable,
        F: Fn(&T) -> N + Send + Sync + 'static,
    {
        self.avg_by_with(selector, CancellationToken::new()).await
    }

    /// Average of a numeric projection, cancellable through `token`
    pub async fn avg_by_with<N, F>(
        &self,
        selector: F,
        token: CancellationToken,
    ) -> Result<N::Output, QueryError>
    where
        N: Averageable,
        F: Fn(&T) -> N + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("avg_by");
        N::dispatch_avg_by(
            &*executor,
            self.raw().clone(),
            Selector::of::<T, _>(selector),
            token,
        )
        .await
    }

    /// Materialize the sequence into a vector
    pub async fn to_vec(&self) -> Result<Vec<T>, QueryError> {
        self.to_vec_with(CancellationToken::new()).await
    }

    /// Materialize the sequence, cancellable through `token`
    pub async fn to_vec_with(&self, token: CancellationToken) -> Result<Vec<T>, QueryError> {
        let executor = installed()?;
        track("to_vec");
        decode_vec(executor.to_vec(self.raw().clone(), token).await?)
    }

    /// Materialize the items satisfying `predicate`
    pub async fn to_vec_where<F>(&self, predicate: F) -> Result<Vec<T>, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.to_vec_where_with(predicate, CancellationToken::new()).await
    }

    /// Materialize the items satisfying `predicate`, cancellable through
    /// `token`
    pub async fn to_vec_where_with<F>(
        &self,
        predicate: F,
        token: CancellationToken,
    ) -> Result<Vec<T>, QueryError>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let executor = installed()?;
        track("to_vec_where");
        decode_vec(
            executor
                .to_vec_where(self.raw().clone(), Predicate::of::<T, _>(predicate), token)
                .await?,
        )
    }
}
