//! Forwarding tests for the sequence operation proxy
//!
//! Every typed operation on `Queryable<T>` must invoke exactly one method of
//! the installed executor, handing over the same source payload, the caller's
//! callbacks in erased form and the caller's cancellation token. A mock
//! executor pins each call down: argument matchers check payload identity and
//! token state, canned returns check that results come back undisturbed.
//!
//! The executor slot is process-wide, so every test here installs its own
//! mock and runs serially.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serial_test::serial;
use tokio_util::sync::CancellationToken;

use plinth::{
    Comparator, ErasedValue, KeyFn, Matcher, Predicate, QueryError, QueryExecutor, Queryable,
    RawQueryable, Selector,
};

mock! {
    pub Executor {}

    #[async_trait]
    impl QueryExecutor for Executor {
        async fn all(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<bool, QueryError>;
        async fn any(&self, source: RawQueryable, token: CancellationToken)
            -> Result<bool, QueryError>;
        async fn any_where(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<bool, QueryError>;
        async fn contains(
            &self,
            source: RawQueryable,
            probe: plinth::Matcher,
            token: CancellationToken,
        ) -> Result<bool, QueryError>;
        async fn count(&self, source: RawQueryable, token: CancellationToken)
            -> Result<u64, QueryError>;
        async fn count_where(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<u64, QueryError>;
        async fn first(&self, source: RawQueryable, token: CancellationToken)
            -> Result<ErasedValue, QueryError>;
        async fn first_where(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<ErasedValue, QueryError>;
        async fn first_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<ErasedValue>, QueryError>;
        async fn first_opt_where(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<Option<ErasedValue>, QueryError>;
        async fn single(&self, source: RawQueryable, token: CancellationToken)
            -> Result<ErasedValue, QueryError>;
        async fn single_where(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<ErasedValue, QueryError>;
        async fn single_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<ErasedValue>, QueryError>;
        async fn single_opt_where(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<Option<ErasedValue>, QueryError>;
        async fn min(
            &self,
            source: RawQueryable,
            compare: Comparator,
            token: CancellationToken,
        ) -> Result<ErasedValue, QueryError>;
        async fn min_by(
            &self,
            source: RawQueryable,
            key: KeyFn,
            compare: Comparator,
            token: CancellationToken,
        ) -> Result<ErasedValue, QueryError>;
        async fn max(
            &self,
            source: RawQueryable,
            compare: Comparator,
            token: CancellationToken,
        ) -> Result<ErasedValue, QueryError>;
        async fn max_by(
            &self,
            source: RawQueryable,
            key: KeyFn,
            compare: Comparator,
            token: CancellationToken,
        ) -> Result<ErasedValue, QueryError>;
        async fn sum_i32(&self, source: RawQueryable, token: CancellationToken)
            -> Result<i32, QueryError>;
        async fn sum_i32_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<i32>, QueryError>;
        async fn sum_i32_by(
            &self,
            source: RawQueryable,
            selector: Selector<i32>,
            token: CancellationToken,
        ) -> Result<i32, QueryError>;
        async fn sum_i32_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<i32>>,
            token: CancellationToken,
        ) -> Result<Option<i32>, QueryError>;
        async fn sum_i64(&self, source: RawQueryable, token: CancellationToken)
            -> Result<i64, QueryError>;
        async fn sum_i64_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<i64>, QueryError>;
        async fn sum_i64_by(
            &self,
            source: RawQueryable,
            selector: Selector<i64>,
            token: CancellationToken,
        ) -> Result<i64, QueryError>;
        async fn sum_i64_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<i64>>,
            token: CancellationToken,
        ) -> Result<Option<i64>, QueryError>;
        async fn sum_f32(&self, source: RawQueryable, token: CancellationToken)
            -> Result<f32, QueryError>;
        async fn sum_f32_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<f32>, QueryError>;
        async fn sum_f32_by(
            &self,
            source: RawQueryable,
            selector: Selector<f32>,
            token: CancellationToken,
        ) -> Result<f32, QueryError>;
        async fn sum_f32_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<f32>>,
            token: CancellationToken,
        ) -> Result<Option<f32>, QueryError>;
        async fn sum_f64(&self, source: RawQueryable, token: CancellationToken)
            -> Result<f64, QueryError>;
        async fn sum_f64_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<f64>, QueryError>;
        async fn sum_f64_by(
            &self,
            source: RawQueryable,
            selector: Selector<f64>,
            token: CancellationToken,
        ) -> Result<f64, QueryError>;
        async fn sum_f64_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<f64>>,
            token: CancellationToken,
        ) -> Result<Option<f64>, QueryError>;
        async fn avg_i32(&self, source: RawQueryable, token: CancellationToken)
            -> Result<f64, QueryError>;
        async fn avg_i32_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<f64>, QueryError>;
        async fn avg_i32_by(
            &self,
            source: RawQueryable,
            selector: Selector<i32>,
            token: CancellationToken,
        ) -> Result<f64, QueryError>;
        async fn avg_i32_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<i32>>,
            token: CancellationToken,
        ) -> Result<Option<f64>, QueryError>;
        async fn avg_i64(&self, source: RawQueryable, token: CancellationToken)
            -> Result<f64, QueryError>;
        async fn avg_i64_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<f64>, QueryError>;
        async fn avg_i64_by(
            &self,
            source: RawQueryable,
            selector: Selector<i64>,
            token: CancellationToken,
        ) -> Result<f64, QueryError>;
        async fn avg_i64_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<i64>>,
            token: CancellationToken,
        ) -> Result<Option<f64>, QueryError>;
        async fn avg_f32(&self, source: RawQueryable, token: CancellationToken)
            -> Result<f32, QueryError>;
        async fn avg_f32_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<f32>, QueryError>;
        async fn avg_f32_by(
            &self,
            source: RawQueryable,
            selector: Selector<f32>,
            token: CancellationToken,
        ) -> Result<f32, QueryError>;
        async fn avg_f32_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<f32>>,
            token: CancellationToken,
        ) -> Result<Option<f32>, QueryError>;
        async fn avg_f64(&self, source: RawQueryable, token: CancellationToken)
            -> Result<f64, QueryError>;
        async fn avg_f64_opt(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Option<f64>, QueryError>;
        async fn avg_f64_by(
            &self,
            source: RawQueryable,
            selector: Selector<f64>,
            token: CancellationToken,
        ) -> Result<f64, QueryError>;
        async fn avg_f64_opt_by(
            &self,
            source: RawQueryable,
            selector: Selector<Option<f64>>,
            token: CancellationToken,
        ) -> Result<Option<f64>, QueryError>;
        async fn to_vec(&self, source: RawQueryable, token: CancellationToken)
            -> Result<Vec<ErasedValue>, QueryError>;
        async fn to_vec_where(
            &self,
            source: RawQueryable,
            predicate: Predicate,
            token: CancellationToken,
        ) -> Result<Vec<ErasedValue>, QueryError>;
    }
}

fn install(mock: MockExecutor) {
    plinth::executor::initialize(Arc::new(mock));
}

fn payload_addr<S: 'static>(raw: &RawQueryable) -> usize {
    raw.downcast_ref::<S>()
        .map(|payload| payload as *const S as usize)
        .unwrap_or(0)
}

fn cancelled() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}

fn positive(predicate: &Predicate) -> bool {
    predicate.test(&4i32).map_or(false, |kept| kept)
        && predicate.test(&-1i32).map_or(false, |kept| !kept)
}

#[tokio::test]
#[serial]
async fn test_all_forwards_predicate_and_token() {
    let source = Queryable::<i32>::new(vec![1i32, 2, 3]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_all()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(false));
    mock.expect_all()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(true));
    install(mock);

    assert!(!source.all_with(|n: &i32| *n > 0, cancelled()).await.unwrap());
    assert!(source.all(|n: &i32| *n > 0).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_any_forwards_source_and_token() {
    let source = Queryable::<i32>::new(vec![5i32]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_any()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(true));
    mock.expect_any()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(false));
    install(mock);

    assert!(source.any_with(cancelled()).await.unwrap());
    assert!(!source.any().await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_any_where_forwards_predicate() {
    let source = Queryable::<i32>::new(vec![1i32, 2]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_any_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(true));
    mock.expect_any_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(true));
    install(mock);

    assert!(source.any_where_with(|n: &i32| *n > 0, cancelled()).await.unwrap());
    assert!(source.any_where(|n: &i32| *n > 0).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_contains_forwards_the_probed_value() {
    let source = Queryable::<i32>::new(vec![1i32, 2, 3]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_contains()
        .withf(move |raw, probe, token| {
            payload_addr::<Vec<i32>>(raw) == addr
                && probe.matches(&2i32).map_or(false, |hit| hit)
                && probe.matches(&9i32).map_or(false, |hit| !hit)
                && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(true));
    mock.expect_contains()
        .withf(move |raw, probe, token| {
            payload_addr::<Vec<i32>>(raw) == addr
                && probe.matches(&2i32).map_or(false, |hit| hit)
                && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(false));
    install(mock);

    assert!(source.contains_with(2, cancelled()).await.unwrap());
    assert!(!source.contains(2).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_count_forwards_source_and_token() {
    let source = Queryable::<i32>::new(vec![1i32, 2, 3]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_count()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(3));
    mock.expect_count()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(3));
    install(mock);

    assert_eq!(source.count_with(cancelled()).await.unwrap(), 3);
    assert_eq!(source.count().await.unwrap(), 3);
}

#[tokio::test]
#[serial]
async fn test_count_where_forwards_predicate() {
    let source = Queryable::<i32>::new(vec![1i32, -2, 3]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_count_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(2));
    mock.expect_count_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(2));
    install(mock);

    assert_eq!(
        source.count_where_with(|n: &i32| *n > 0, cancelled()).await.unwrap(),
        2
    );
    assert_eq!(source.count_where(|n: &i32| *n > 0).await.unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_first_decodes_the_backend_item() {
    let source = Queryable::<i32>::new(vec![11i32, 12]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_first()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(Box::new(11i32) as ErasedValue));
    mock.expect_first()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(Box::new(11i32) as ErasedValue));
    install(mock);

    assert_eq!(source.first_with(cancelled()).await.unwrap(), 11);
    assert_eq!(source.first().await.unwrap(), 11);
}

#[tokio::test]
#[serial]
async fn test_first_where_forwards_predicate() {
    let source = Queryable::<i32>::new(vec![-1i32, 8]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_first_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(8i32) as ErasedValue));
    mock.expect_first_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(8i32) as ErasedValue));
    install(mock);

    assert_eq!(
        source.first_where_with(|n: &i32| *n > 0, cancelled()).await.unwrap(),
        8
    );
    assert_eq!(source.first_where(|n: &i32| *n > 0).await.unwrap(), 8);
}

#[tokio::test]
#[serial]
async fn test_first_opt_decodes_present_and_absent() {
    let source = Queryable::<i32>::new(vec![7i32]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_first_opt()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(Some(Box::new(7i32) as ErasedValue)));
    mock.expect_first_opt()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(None));
    install(mock);

    assert_eq!(source.first_opt_with(cancelled()).await.unwrap(), Some(7));
    assert_eq!(source.first_opt().await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_first_opt_where_forwards_predicate() {
    let source = Queryable::<i32>::new(vec![7i32]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_first_opt_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Some(Box::new(7i32) as ErasedValue)));
    mock.expect_first_opt_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(None));
    install(mock);

    assert_eq!(
        source
            .first_opt_where_with(|n: &i32| *n > 0, cancelled())
            .await
            .unwrap(),
        Some(7)
    );
    assert_eq!(source.first_opt_where(|n: &i32| *n > 0).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_single_decodes_the_backend_item() {
    let source = Queryable::<i32>::new(vec![42i32]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_single()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(Box::new(42i32) as ErasedValue));
    mock.expect_single()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(Box::new(42i32) as ErasedValue));
    install(mock);

    assert_eq!(source.single_with(cancelled()).await.unwrap(), 42);
    assert_eq!(source.single().await.unwrap(), 42);
}

#[tokio::test]
#[serial]
async fn test_single_where_forwards_predicate() {
    let source = Queryable::<i32>::new(vec![-3i32, 42]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_single_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(42i32) as ErasedValue));
    mock.expect_single_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(42i32) as ErasedValue));
    install(mock);

    assert_eq!(
        source.single_where_with(|n: &i32| *n > 0, cancelled()).await.unwrap(),
        42
    );
    assert_eq!(source.single_where(|n: &i32| *n > 0).await.unwrap(), 42);
}

#[tokio::test]
#[serial]
async fn test_single_opt_decodes_present_and_absent() {
    let source = Queryable::<i32>::new(Vec::<i32>::new());
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_single_opt()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(Some(Box::new(9i32) as ErasedValue)));
    mock.expect_single_opt()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(None));
    install(mock);

    assert_eq!(source.single_opt_with(cancelled()).await.unwrap(), Some(9));
    assert_eq!(source.single_opt().await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_single_opt_where_forwards_predicate() {
    let source = Queryable::<i32>::new(vec![9i32]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_single_opt_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Some(Box::new(9i32) as ErasedValue)));
    mock.expect_single_opt_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(None));
    install(mock);

    assert_eq!(
        source
            .single_opt_where_with(|n: &i32| *n > 0, cancelled())
            .await
            .unwrap(),
        Some(9)
    );
    assert_eq!(source.single_opt_where(|n: &i32| *n > 0).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_min_forwards_an_ord_comparator() {
    let source = Queryable::<i32>::new(vec![3i32, 1, 2]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_min()
        .withf(move |raw, compare, token| {
            payload_addr::<Vec<i32>>(raw) == addr
                && compare
                    .compare(&1i32, &2i32)
                    .map_or(false, |order| order == Ordering::Less)
                && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(1i32) as ErasedValue));
    mock.expect_min()
        .withf(move |raw, compare, token| {
            payload_addr::<Vec<i32>>(raw) == addr
                && compare
                    .compare(&2i32, &2i32)
                    .map_or(false, |order| order == Ordering::Equal)
                && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(1i32) as ErasedValue));
    install(mock);

    assert_eq!(source.min_with(cancelled()).await.unwrap(), 1);
    assert_eq!(source.min().await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_min_by_forwards_key_projection_and_key_order() {
    let source = Queryable::<i32>::new(vec![10i32, 4]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    // Caller projects i32 items to doubled i64 keys; the comparator the
    // backend receives must order the keys, not the items.
    let check = move |raw: &RawQueryable, key: &KeyFn, compare: &Comparator| {
        payload_addr::<Vec<i32>>(raw) == addr
            && key
                .apply(&10i32)
                .map_or(false, |k| k.downcast_ref::<i64>() == Some(&20i64))
            && compare
                .compare(&8i64, &20i64)
                .map_or(false, |order| order == Ordering::Less)
    };

    let mut mock = MockExecutor::new();
    mock.expect_min_by()
        .withf(move |raw, key, compare, token| check(raw, key, compare) && token.is_cancelled())
        .times(1)
        .returning(|_, _, _, _| Ok(Box::new(8i64) as ErasedValue));
    mock.expect_min_by()
        .withf(move |raw, key, compare, token| check(raw, key, compare) && !token.is_cancelled())
        .times(1)
        .returning(|_, _, _, _| Ok(Box::new(8i64) as ErasedValue));
    install(mock);

    assert_eq!(
        source
            .min_by_with(|n: &i32| i64::from(*n) * 2, cancelled())
            .await
            .unwrap(),
        8
    );
    assert_eq!(source.min_by(|n: &i32| i64::from(*n) * 2).await.unwrap(), 8);
}

#[tokio::test]
#[serial]
async fn test_max_forwards_an_ord_comparator() {
    let source = Queryable::<i32>::new(vec![3i32, 9]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_max()
        .withf(move |raw, compare, token| {
            payload_addr::<Vec<i32>>(raw) == addr
                && compare
                    .compare(&9i32, &3i32)
                    .map_or(false, |order| order == Ordering::Greater)
                && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(9i32) as ErasedValue));
    mock.expect_max()
        .withf(move |raw, _compare, token| {
            payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| Ok(Box::new(9i32) as ErasedValue));
    install(mock);

    assert_eq!(source.max_with(cancelled()).await.unwrap(), 9);
    assert_eq!(source.max().await.unwrap(), 9);
}

#[tokio::test]
#[serial]
async fn test_max_by_forwards_key_projection_and_key_order() {
    let source = Queryable::<i32>::new(vec![10i32, 4]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let check = move |raw: &RawQueryable, key: &KeyFn, compare: &Comparator| {
        payload_addr::<Vec<i32>>(raw) == addr
            && key
                .apply(&4i32)
                .map_or(false, |k| k.downcast_ref::<i64>() == Some(&8i64))
            && compare
                .compare(&20i64, &8i64)
                .map_or(false, |order| order == Ordering::Greater)
    };

    let mut mock = MockExecutor::new();
    mock.expect_max_by()
        .withf(move |raw, key, compare, token| check(raw, key, compare) && token.is_cancelled())
        .times(1)
        .returning(|_, _, _, _| Ok(Box::new(20i64) as ErasedValue));
    mock.expect_max_by()
        .withf(move |raw, key, compare, token| check(raw, key, compare) && !token.is_cancelled())
        .times(1)
        .returning(|_, _, _, _| Ok(Box::new(20i64) as ErasedValue));
    install(mock);

    assert_eq!(
        source
            .max_by_with(|n: &i32| i64::from(*n) * 2, cancelled())
            .await
            .unwrap(),
        20
    );
    assert_eq!(source.max_by(|n: &i32| i64::from(*n) * 2).await.unwrap(), 20);
}

#[tokio::test]
#[serial]
async fn test_to_vec_decodes_the_backend_items() {
    let source = Queryable::<i32>::new(vec![1i32, 2]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_to_vec()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(vec![Box::new(1i32) as ErasedValue, Box::new(2i32) as ErasedValue]));
    mock.expect_to_vec()
        .withf(move |raw, token| payload_addr::<Vec<i32>>(raw) == addr && !token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(Vec::new()));
    install(mock);

    assert_eq!(source.to_vec_with(cancelled()).await.unwrap(), vec![1, 2]);
    assert!(source.to_vec().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_to_vec_where_forwards_predicate() {
    let source = Queryable::<i32>::new(vec![1i32, -2, 3]);
    let addr = payload_addr::<Vec<i32>>(source.raw());

    let mut mock = MockExecutor::new();
    mock.expect_to_vec_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| {
            Ok(vec![Box::new(1i32) as ErasedValue, Box::new(3i32) as ErasedValue])
        });
    mock.expect_to_vec_where()
        .withf(move |raw, predicate, token| {
            payload_addr::<Vec<i32>>(raw) == addr && positive(predicate) && !token.is_cancelled()
        })
        .times(1)
        .returning(|_, _, _| {
            Ok(vec![Box::new(1i32) as ErasedValue, Box::new(3i32) as ErasedValue])
        });
    install(mock);

    assert_eq!(
        source
            .to_vec_where_with(|n: &i32| *n > 0, cancelled())
            .await
            .unwrap(),
        vec![1, 3]
    );
    assert_eq!(
        source.to_vec_where(|n: &i32| *n > 0).await.unwrap(),
        vec![1, 3]
    );
}

#[tokio::test]
#[serial]
async fn test_sum_dispatches_per_element_type() {
    let mut mock = MockExecutor::new();
    mock.expect_sum_i32().times(1).returning(|_, _| Ok(6));
    mock.expect_sum_i64().times(1).returning(|_, _| Ok(60));
    mock.expect_sum_f32().times(1).returning(|_, _| Ok(1.5));
    mock.expect_sum_f64().times(1).returning(|_, _| Ok(2.5));
    mock.expect_sum_i32_opt().times(1).returning(|_, _| Ok(Some(6)));
    mock.expect_sum_i64_opt().times(1).returning(|_, _| Ok(Some(60)));
    mock.expect_sum_f32_opt().times(1).returning(|_, _| Ok(Some(1.5)));
    mock.expect_sum_f64_opt().times(1).returning(|_, _| Ok(Some(2.5)));
    install(mock);

    assert_eq!(Queryable::<i32>::new(vec![1i32]).sum().await.unwrap(), 6);
    assert_eq!(Queryable::<i64>::new(vec![1i64]).sum().await.unwrap(), 60);
    assert_eq!(Queryable::<f32>::new(vec![1f32]).sum().await.unwrap(), 1.5);
    assert_eq!(Queryable::<f64>::new(vec![1f64]).sum().await.unwrap(), 2.5);
    assert_eq!(
        Queryable::<Option<i32>>::new(vec![Some(1i32)]).sum().await.unwrap(),
        Some(6)
    );
    assert_eq!(
        Queryable::<Option<i64>>::new(vec![Some(1i64)]).sum().await.unwrap(),
        Some(60)
    );
    assert_eq!(
        Queryable::<Option<f32>>::new(vec![Some(1f32)]).sum().await.unwrap(),
        Some(1.5)
    );
    assert_eq!(
        Queryable::<Option<f64>>::new(vec![Some(1f64)]).sum().await.unwrap(),
        Some(2.5)
    );
}

#[tokio::test]
#[serial]
async fn test_sum_by_dispatches_per_selector_type() {
    let source = Queryable::<i32>::new(vec![3i32]);

    let mut mock = MockExecutor::new();
    mock.expect_sum_i32_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 6))
        .times(1)
        .returning(|_, _, _| Ok(6));
    mock.expect_sum_i64_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 6))
        .times(1)
        .returning(|_, _, _| Ok(60));
    mock.expect_sum_f32_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 1.5))
        .times(1)
        .returning(|_, _, _| Ok(1.5));
    mock.expect_sum_f64_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 2.5))
        .times(1)
        .returning(|_, _, _| Ok(2.5));
    mock.expect_sum_i32_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == Some(6)))
        .times(1)
        .returning(|_, _, _| Ok(Some(6)));
    mock.expect_sum_i64_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == Some(60)))
        .times(1)
        .returning(|_, _, _| Ok(Some(60)));
    mock.expect_sum_f32_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == Some(1.5)))
        .times(1)
        .returning(|_, _, _| Ok(Some(1.5)));
    mock.expect_sum_f64_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == Some(2.5)))
        .times(1)
        .returning(|_, _, _| Ok(Some(2.5)));
    install(mock);

    assert_eq!(source.sum_by(|n: &i32| n * 2).await.unwrap(), 6);
    assert_eq!(source.sum_by(|n: &i32| i64::from(*n) * 2).await.unwrap(), 60);
    assert_eq!(source.sum_by(|_: &i32| 1.5f32).await.unwrap(), 1.5);
    assert_eq!(source.sum_by(|_: &i32| 2.5f64).await.unwrap(), 2.5);
    assert_eq!(source.sum_by(|n: &i32| Some(n * 2)).await.unwrap(), Some(6));
    assert_eq!(
        source.sum_by(|n: &i32| Some(i64::from(*n) * 2)).await.unwrap(),
        Some(60)
    );
    assert_eq!(source.sum_by(|_: &i32| Some(1.5f32)).await.unwrap(), Some(1.5));
    assert_eq!(source.sum_by(|_: &i32| Some(2.5f64)).await.unwrap(), Some(2.5));
}

#[tokio::test]
#[serial]
async fn test_avg_dispatches_per_element_type() {
    let mut mock = MockExecutor::new();
    mock.expect_avg_i32().times(1).returning(|_, _| Ok(2.0));
    mock.expect_avg_i64().times(1).returning(|_, _| Ok(20.0));
    mock.expect_avg_f32().times(1).returning(|_, _| Ok(1.5f32));
    mock.expect_avg_f64().times(1).returning(|_, _| Ok(2.5));
    mock.expect_avg_i32_opt().times(1).returning(|_, _| Ok(Some(2.0)));
    mock.expect_avg_i64_opt().times(1).returning(|_, _| Ok(None));
    mock.expect_avg_f32_opt().times(1).returning(|_, _| Ok(Some(1.5f32)));
    mock.expect_avg_f64_opt().times(1).returning(|_, _| Ok(Some(2.5)));
    install(mock);

    // Integer averages widen to f64, float averages keep their width
    assert_eq!(Queryable::<i32>::new(vec![1i32]).avg().await.unwrap(), 2.0);
    assert_eq!(Queryable::<i64>::new(vec![1i64]).avg().await.unwrap(), 20.0);
    assert_eq!(Queryable::<f32>::new(vec![1f32]).avg().await.unwrap(), 1.5f32);
    assert_eq!(Queryable::<f64>::new(vec![1f64]).avg().await.unwrap(), 2.5);
    assert_eq!(
        Queryable::<Option<i32>>::new(vec![Some(1i32)]).avg().await.unwrap(),
        Some(2.0)
    );
    assert_eq!(
        Queryable::<Option<i64>>::new(vec![None::<i64>]).avg().await.unwrap(),
        None
    );
    assert_eq!(
        Queryable::<Option<f32>>::new(vec![Some(1f32)]).avg().await.unwrap(),
        Some(1.5f32)
    );
    assert_eq!(
        Queryable::<Option<f64>>::new(vec![Some(1f64)]).avg().await.unwrap(),
        Some(2.5)
    );
}

#[tokio::test]
#[serial]
async fn test_avg_by_dispatches_per_selector_type() {
    let source = Queryable::<i32>::new(vec![3i32]);

    let mut mock = MockExecutor::new();
    mock.expect_avg_i32_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 6))
        .times(1)
        .returning(|_, _, _| Ok(6.0));
    mock.expect_avg_i64_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 6))
        .times(1)
        .returning(|_, _, _| Ok(60.0));
    mock.expect_avg_f32_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 1.5))
        .times(1)
        .returning(|_, _, _| Ok(1.5f32));
    mock.expect_avg_f64_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == 2.5))
        .times(1)
        .returning(|_, _, _| Ok(2.5));
    mock.expect_avg_i32_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == Some(6)))
        .times(1)
        .returning(|_, _, _| Ok(Some(6.0)));
    mock.expect_avg_i64_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v.is_none()))
        .times(1)
        .returning(|_, _, _| Ok(None));
    mock.expect_avg_f32_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == Some(1.5)))
        .times(1)
        .returning(|_, _, _| Ok(Some(1.5f32)));
    mock.expect_avg_f64_opt_by()
        .withf(|_, selector, _| selector.select(&3i32).map_or(false, |v| v == Some(2.5)))
        .times(1)
        .returning(|_, _, _| Ok(Some(2.5)));
    install(mock);

    assert_eq!(source.avg_by(|n: &i32| n * 2).await.unwrap(), 6.0);
    assert_eq!(source.avg_by(|n: &i32| i64::from(*n) * 2).await.unwrap(), 60.0);
    assert_eq!(source.avg_by(|_: &i32| 1.5f32).await.unwrap(), 1.5f32);
    assert_eq!(source.avg_by(|_: &i32| 2.5f64).await.unwrap(), 2.5);
    assert_eq!(source.avg_by(|n: &i32| Some(n * 2)).await.unwrap(), Some(6.0));
    assert_eq!(source.avg_by(|_: &i32| None::<i64>).await.unwrap(), None);
    assert_eq!(
        source.avg_by(|_: &i32| Some(1.5f32)).await.unwrap(),
        Some(1.5f32)
    );
    assert_eq!(
        source.avg_by(|_: &i32| Some(2.5f64)).await.unwrap(),
        Some(2.5)
    );
}

#[tokio::test]
#[serial]
async fn test_numeric_with_variants_pass_the_callers_token() {
    let source = Queryable::<i32>::new(vec![1i32]);

    let mut mock = MockExecutor::new();
    mock.expect_sum_i32()
        .withf(|_, token| token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(1));
    mock.expect_sum_i32_by()
        .withf(|_, _, token| token.is_cancelled())
        .times(1)
        .returning(|_, _, _| Ok(2));
    mock.expect_avg_i32()
        .withf(|_, token| token.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(3.0));
    mock.expect_avg_i32_by()
        .withf(|_, _, token| token.is_cancelled())
        .times(1)
        .returning(|_, _, _| Ok(4.0));
    install(mock);

    assert_eq!(source.sum_with(cancelled()).await.unwrap(), 1);
    assert_eq!(source.sum_by_with(|n: &i32| *n, cancelled()).await.unwrap(), 2);
    assert_eq!(source.avg_with(cancelled()).await.unwrap(), 3.0);
    assert_eq!(source.avg_by_with(|n: &i32| *n, cancelled()).await.unwrap(), 4.0);
}

#[tokio::test]
#[serial]
async fn test_reinitialization_replaces_the_executor() {
    let mut first = MockExecutor::new();
    first.expect_count().times(1).returning(|_, _| Ok(1));
    install(first);
    assert!(plinth::executor::is_initialized());

    let source = Queryable::<i32>::new(vec![0i32]);
    assert_eq!(source.count().await.unwrap(), 1);

    // The last installed executor wins; the first one no longer sees calls
    let mut second = MockExecutor::new();
    second.expect_count().times(1).returning(|_, _| Ok(2));
    install(second);

    assert_eq!(source.count().await.unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_backend_returning_a_foreign_type_is_a_result_mismatch() {
    let source = Queryable::<i32>::new(vec![1i32]);

    let mut mock = MockExecutor::new();
    mock.expect_first()
        .times(1)
        .returning(|_, _| Ok(Box::new(String::from("not an i32")) as ErasedValue));
    install(mock);

    let err = source.first().await.unwrap_err();
    assert!(matches!(err, QueryError::ResultMismatch { .. }));
}

#[tokio::test]
#[serial]
async fn test_backend_errors_surface_unchanged() {
    let source = Queryable::<i32>::new(Vec::<i32>::new());

    let mut mock = MockExecutor::new();
    mock.expect_first().times(1).returning(|_, _| Err(QueryError::NoElements));
    mock.expect_single()
        .times(1)
        .returning(|_, _| Err(QueryError::MultipleElements));
    install(mock);

    assert!(matches!(
        source.first().await.unwrap_err(),
        QueryError::NoElements
    ));
    assert!(matches!(
        source.single().await.unwrap_err(),
        QueryError::MultipleElements
    ));
}
