//! # In-Memory Query Executor
//!
//! Reference [`QueryExecutor`] over snapshot sequences, meant for tests
//! and local development. The executor itself is stateless; each
//! [`MemorySequence`] payload carries a point-in-time snapshot of the
//! entities it was built from, so one installed instance serves every
//! store in the process.
//!
//! The cancellation token is checked once on entry of every operation.

use std::any::Any;
use std::cmp::Ordering;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::QueryError;
use crate::executor::{
    Comparator, ErasedValue, KeyFn, Matcher, Predicate, QueryExecutor, RawQueryable, Selector,
};

/// Snapshot item with its type erased
pub type ErasedItem = Box<dyn Any + Send + Sync>;

/// Point-in-time snapshot of a sequence, usable as a [`RawQueryable`]
/// payload
pub struct MemorySequence {
    items: Vec<ErasedItem>,
    duplicate: Box<dyn Fn(&dyn Any) -> Result<ErasedValue, QueryError> + Send + Sync>,
}

impl MemorySequence {
    /// Snapshot `items` into an erased sequence
    pub fn of<T>(items: impl IntoIterator<Item = T>) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            items: items
                .into_iter()
                .map(|item| Box::new(item) as ErasedItem)
                .collect(),
            duplicate: Box::new(|item| {
                item.downcast_ref::<T>()
                    .map(|item| Box::new(item.clone()) as ErasedValue)
                    .ok_or_else(|| QueryError::item_mismatch::<T>())
            }),
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn items(&self) -> impl Iterator<Item = &dyn Any> + '_ {
        self.items.iter().map(|item| item.as_ref() as &dyn Any)
    }

    fn duplicate(&self, item: &dyn Any) -> Result<ErasedValue, QueryError> {
        (self.duplicate)(item)
    }
}

/// Stateless executor computing every operation over [`MemorySequence`]
/// payloads
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryExecutor;

impl MemoryExecutor {
    pub fn new() -> Self {
        Self
    }
}

fn ensure_live(token: &CancellationToken) -> Result<(), QueryError> {
    if token.is_cancelled() {
        return Err(QueryError::Cancelled);
    }
    Ok(())
}

fn item_as<T: Copy + 'static>(item: &dyn Any) -> Result<T, QueryError> {
    item.downcast_ref::<T>()
        .copied()
        .ok_or_else(|| QueryError::item_mismatch::<T>())
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn all(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<bool, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        for item in seq.items() {
            if !predicate.test(item)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn any(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<bool, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        Ok(!seq.is_empty())
    }

    async fn any_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<bool, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        for item in seq.items() {
            if predicate.test(item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn contains(
        &self,
        source: RawQueryable,
        probe: Matcher,
        token: CancellationToken,
    ) -> Result<bool, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        for item in seq.items() {
            if probe.matches(item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn count(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<u64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        Ok(seq.len() as u64)
    }

    async fn count_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<u64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut matched = 0u64;
        for item in seq.items() {
            if predicate.test(item)? {
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn first(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        match seq.items().next() {
            Some(item) => seq.duplicate(item),
            None => Err(QueryError::NoElements),
        }
    }

    async fn first_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        for item in seq.items() {
            if predicate.test(item)? {
                return seq.duplicate(item);
            }
        }
        Err(QueryError::NoElements)
    }

    async fn first_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        seq.items().next().map(|item| seq.duplicate(item)).transpose()
    }

    async fn first_opt_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        for item in seq.items() {
            if predicate.test(item)? {
                return seq.duplicate(item).map(Some);
            }
        }
        Ok(None)
    }

    async fn single(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        match seq.len() {
            0 => Err(QueryError::NoElements),
            1 => seq.duplicate(seq.items().next().ok_or(QueryError::NoElements)?),
            _ => Err(QueryError::MultipleElements),
        }
    }

    async fn single_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut found = None;
        for item in seq.items() {
            if predicate.test(item)? {
                if found.is_some() {
                    return Err(QueryError::MultipleElements);
                }
                found = Some(item);
            }
        }
        match found {
            Some(item) => seq.duplicate(item),
            None => Err(QueryError::NoElements),
        }
    }

    async fn single_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        match seq.len() {
            0 => Ok(None),
            1 => seq.items().next().map(|item| seq.duplicate(item)).transpose(),
            _ => Err(QueryError::MultipleElements),
        }
    }

    async fn single_opt_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<Option<ErasedValue>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut found = None;
        for item in seq.items() {
            if predicate.test(item)? {
                if found.is_some() {
                    return Err(QueryError::MultipleElements);
                }
                found = Some(item);
            }
        }
        found.map(|item| seq.duplicate(item)).transpose()
    }

    async fn min(
        &self,
        source: RawQueryable,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut best: Option<&dyn Any> = None;
        for item in seq.items() {
            best = match best {
                None => Some(item),
                Some(current) => {
                    if compare.compare(item, current)? == Ordering::Less {
                        Some(item)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        match best {
            Some(item) => seq.duplicate(item),
            None => Err(QueryError::NoElements),
        }
    }

    async fn min_by(
        &self,
        source: RawQueryable,
        key: KeyFn,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut best: Option<ErasedValue> = None;
        for item in seq.items() {
            let candidate = key.apply(item)?;
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    if compare.compare(candidate.as_ref(), current.as_ref())? == Ordering::Less {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.ok_or(QueryError::NoElements)
    }

    async fn max(
        &self,
        source: RawQueryable,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut best: Option<&dyn Any> = None;
        for item in seq.items() {
            best = match best {
                None => Some(item),
                Some(current) => {
                    if compare.compare(item, current)? == Ordering::Greater {
                        Some(item)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        match best {
            Some(item) => seq.duplicate(item),
            None => Err(QueryError::NoElements),
        }
    }

    async fn max_by(
        &self,
        source: RawQueryable,
        key: KeyFn,
        compare: Comparator,
        token: CancellationToken,
    ) -> Result<ErasedValue, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut best: Option<ErasedValue> = None;
        for item in seq.items() {
            let candidate = key.apply(item)?;
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    if compare.compare(candidate.as_ref(), current.as_ref())? == Ordering::Greater {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.ok_or(QueryError::NoElements)
    }

    async fn sum_i32(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<i32, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i32;
        for item in seq.items() {
            total = total
                .checked_add(item_as::<i32>(item)?)
                .ok_or_else(|| QueryError::backend("i32 sum overflowed"))?;
        }
        Ok(total)
    }

    async fn sum_i32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<i32>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i32;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<i32>>(item)? {
                total = total
                    .checked_add(value)
                    .ok_or_else(|| QueryError::backend("i32 sum overflowed"))?;
            }
        }
        Ok(Some(total))
    }

    async fn sum_i32_by(
        &self,
        source: RawQueryable,
        selector: Selector<i32>,
        token: CancellationToken,
    ) -> Result<i32, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i32;
        for item in seq.items() {
            total = total
                .checked_add(selector.select(item)?)
                .ok_or_else(|| QueryError::backend("i32 sum overflowed"))?;
        }
        Ok(total)
    }

    async fn sum_i32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i32>>,
        token: CancellationToken,
    ) -> Result<Option<i32>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i32;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total = total
                    .checked_add(value)
                    .ok_or_else(|| QueryError::backend("i32 sum overflowed"))?;
            }
        }
        Ok(Some(total))
    }

    async fn sum_i64(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<i64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i64;
        for item in seq.items() {
            total = total
                .checked_add(item_as::<i64>(item)?)
                .ok_or_else(|| QueryError::backend("i64 sum overflowed"))?;
        }
        Ok(total)
    }

    async fn sum_i64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<i64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i64;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<i64>>(item)? {
                total = total
                    .checked_add(value)
                    .ok_or_else(|| QueryError::backend("i64 sum overflowed"))?;
            }
        }
        Ok(Some(total))
    }

    async fn sum_i64_by(
        &self,
        source: RawQueryable,
        selector: Selector<i64>,
        token: CancellationToken,
    ) -> Result<i64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i64;
        for item in seq.items() {
            total = total
                .checked_add(selector.select(item)?)
                .ok_or_else(|| QueryError::backend("i64 sum overflowed"))?;
        }
        Ok(total)
    }

    async fn sum_i64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i64>>,
        token: CancellationToken,
    ) -> Result<Option<i64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0i64;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total = total
                    .checked_add(value)
                    .ok_or_else(|| QueryError::backend("i64 sum overflowed"))?;
            }
        }
        Ok(Some(total))
    }

    async fn sum_f32(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<f32, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            total += item_as::<f32>(item)? as f64;
        }
        Ok(total as f32)
    }

    async fn sum_f32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<f32>>(item)? {
                total += value as f64;
            }
        }
        Ok(Some(total as f32))
    }

    async fn sum_f32_by(
        &self,
        source: RawQueryable,
        selector: Selector<f32>,
        token: CancellationToken,
    ) -> Result<f32, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            total += selector.select(item)? as f64;
        }
        Ok(total as f32)
    }

    async fn sum_f32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f32>>,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total += value as f64;
            }
        }
        Ok(Some(total as f32))
    }

    async fn sum_f64(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            total += item_as::<f64>(item)?;
        }
        Ok(total)
    }

    async fn sum_f64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<f64>>(item)? {
                total += value;
            }
        }
        Ok(Some(total))
    }

    async fn sum_f64_by(
        &self,
        source: RawQueryable,
        selector: Selector<f64>,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            total += selector.select(item)?;
        }
        Ok(total)
    }

    async fn sum_f64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f64>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total += value;
            }
        }
        Ok(Some(total))
    }

    async fn avg_i32(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += item_as::<i32>(item)? as f64;
        }
        Ok(total / seq.len() as f64)
    }

    async fn avg_i32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<i32>>(item)? {
                total += value as f64;
                present += 1;
            }
        }
        Ok((present > 0).then(|| total / present as f64))
    }

    async fn avg_i32_by(
        &self,
        source: RawQueryable,
        selector: Selector<i32>,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += selector.select(item)? as f64;
        }
        Ok(total / seq.len() as f64)
    }

    async fn avg_i32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i32>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total += value as f64;
                present += 1;
            }
        }
        Ok((present > 0).then(|| total / present as f64))
    }

    async fn avg_i64(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += item_as::<i64>(item)? as f64;
        }
        Ok(total / seq.len() as f64)
    }

    async fn avg_i64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<i64>>(item)? {
                total += value as f64;
                present += 1;
            }
        }
        Ok((present > 0).then(|| total / present as f64))
    }

    async fn avg_i64_by(
        &self,
        source: RawQueryable,
        selector: Selector<i64>,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += selector.select(item)? as f64;
        }
        Ok(total / seq.len() as f64)
    }

    async fn avg_i64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<i64>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total += value as f64;
                present += 1;
            }
        }
        Ok((present > 0).then(|| total / present as f64))
    }

    async fn avg_f32(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<f32, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += item_as::<f32>(item)? as f64;
        }
        Ok((total / seq.len() as f64) as f32)
    }

    async fn avg_f32_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<f32>>(item)? {
                total += value as f64;
                present += 1;
            }
        }
        Ok((present > 0).then(|| (total / present as f64) as f32))
    }

    async fn avg_f32_by(
        &self,
        source: RawQueryable,
        selector: Selector<f32>,
        token: CancellationToken,
    ) -> Result<f32, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += selector.select(item)? as f64;
        }
        Ok((total / seq.len() as f64) as f32)
    }

    async fn avg_f32_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f32>>,
        token: CancellationToken,
    ) -> Result<Option<f32>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total += value as f64;
                present += 1;
            }
        }
        Ok((present > 0).then(|| (total / present as f64) as f32))
    }

    async fn avg_f64(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += item_as::<f64>(item)?;
        }
        Ok(total / seq.len() as f64)
    }

    async fn avg_f64_opt(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = item_as::<Option<f64>>(item)? {
                total += value;
                present += 1;
            }
        }
        Ok((present > 0).then(|| total / present as f64))
    }

    async fn avg_f64_by(
        &self,
        source: RawQueryable,
        selector: Selector<f64>,
        token: CancellationToken,
    ) -> Result<f64, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        if seq.is_empty() {
            return Err(QueryError::NoElements);
        }
        let mut total = 0f64;
        for item in seq.items() {
            total += selector.select(item)?;
        }
        Ok(total / seq.len() as f64)
    }

    async fn avg_f64_opt_by(
        &self,
        source: RawQueryable,
        selector: Selector<Option<f64>>,
        token: CancellationToken,
    ) -> Result<Option<f64>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut total = 0f64;
        let mut present = 0u64;
        for item in seq.items() {
            if let Some(value) = selector.select(item)? {
                total += value;
                present += 1;
            }
        }
        Ok((present > 0).then(|| total / present as f64))
    }

    async fn to_vec(
        &self,
        source: RawQueryable,
        token: CancellationToken,
    ) -> Result<Vec<ErasedValue>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        seq.items().map(|item| seq.duplicate(item)).collect()
    }

    async fn to_vec_where(
        &self,
        source: RawQueryable,
        predicate: Predicate,
        token: CancellationToken,
    ) -> Result<Vec<ErasedValue>, QueryError> {
        ensure_live(&token)?;
        let seq = source.downcast_ref::<MemorySequence>()?;
        let mut matched = Vec::new();
        for item in seq.items() {
            if predicate.test(item)? {
                matched.push(seq.duplicate(item)?);
            }
        }
        Ok(matched)
    }
}
