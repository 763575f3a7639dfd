//! # Numeric Aggregate Families
//!
//! Sealed bridges between the generic `sum`/`avg` surface and the
//! per-primitive executor methods. Each summable or averageable element
//! type knows which executor method carries it and what the aggregate
//! returns: sums keep their element type, integer averages widen to `f64`,
//! float averages keep their width, and the `Option` families mirror all
//! of it while skipping absent values.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::source::{RawQueryable, Selector};
use super::traits::QueryExecutor;
use crate::error::QueryError;

mod private {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for Option<i32> {}
    impl Sealed for Option<i64> {}
    impl Sealed for Option<f32> {}
    impl Sealed for Option<f64> {}
}

/// Element types the executor grid can sum
pub trait Summable: private::Sealed + Send + Sized + 'static {
    /// Aggregate type produced by summing this element type
    type Output: Send + 'static;

    #[doc(hidden)]
    fn dispatch_sum<'a>(
        executor: &'a dyn QueryExecutor,
        source: RawQueryable,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Self::Output, QueryError>>;

    #[doc(hidden)]
    fn dispatch_sum_by<'a>(
        executor: &'a dyn QueryExecutor,
        source: RawQueryable,
        selector: Selector<Self>,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Self::Output, QueryError>>;
}

/// Element types the executor grid can average
pub trait Averageable: private::Sealed + Send + Sized + 'static {
    /// Aggregate type produced by averaging this element type
    type Output: Send + 'static;

    #[doc(hidden)]
    fn dispatch_avg<'a>(
        executor: &'a dyn QueryExecutor,
        source: RawQueryable,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Self::Output, QueryError>>;

    #[doc(hidden)]
    fn dispatch_avg_by<'a>(
        executor: &'a dyn QueryExecutor,
        source: RawQueryable,
        selector: Selector<Self>,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Self::Output, QueryError>>;
}

macro_rules! summable {
    ($elem:ty, $out:ty, $sum:ident, $sum_by:ident) => {
        impl Summable for $elem {
            type Output = $out;

            fn dispatch_sum<'a>(
                executor: &'a dyn QueryExecutor,
                source: RawQueryable,
                token: CancellationToken,
            ) -> BoxFuture<'a, Result<Self::Output, QueryError>> {
                executor.$sum(source, token)
            }

            fn dispatch_sum_by<'a>(
                executor: &'a dyn QueryExecutor,
                source: RawQueryable,
                selector: Selector<Self>,
                token: CancellationToken,
            ) -> BoxFuture<'a, Result<Self::Output, QueryError>> {
                executor.$sum_by(source, selector, token)
            }
        }
    };
}

macro_rules! averageable {
    ($elem:ty, $out:ty, $avg:ident, $avg_by:ident) => {
        impl Averageable for $elem {
            type Output = $out;

            fn dispatch_avg<'a>(
                executor: &'a dyn QueryExecutor,
                source: RawQueryable,
                token: CancellationToken,
            ) -> BoxFuture<'a, Result<Self::Output, QueryError>> {
                executor.$avg(source, token)
            }

            fn dispatch_avg_by<'a>(
                executor: &'a dyn QueryExecutor,
                source: RawQueryable,
                selector: Selector<Self>,
                token: CancellationToken,
            ) -> BoxFuture<'a, Result<Self::Output, QueryError>> {
                executor.$avg_by(source, selector, token)
            }
        }
    };
}

summable!(i32, i32, sum_i32, sum_i32_by);
summable!(Option<i32>, Option<i32>, sum_i32_opt, sum_i32_opt_by);
summable!(i64, i64, sum_i64, sum_i64_by);
summable!(Option<i64>, Option<i64>, sum_i64_opt, sum_i64_opt_by);
summable!(f32, f32, sum_f32, sum_f32_by);
summable!(Option<f32>, Option<f32>, sum_f32_opt, sum_f32_opt_by);
summable!(f64, f64, sum_f64, sum_f64_by);
summable!(Option<f64>, Option<f64>, sum_f64_opt, sum_f64_opt_by);

averageable!(i32, f64, avg_i32, avg_i32_by);
averageable!(Option<i32>, Option<f64>, avg_i32_opt, avg_i32_opt_by);
averageable!(i64, f64, avg_i64, avg_i64_by);
averageable!(Option<i64>, Option<f64>, avg_i64_opt, avg_i64_opt_by);
averageable!(f32, f32, avg_f32, avg_f32_by);
averageable!(Option<f32>, Option<f32>, avg_f32_opt, avg_f32_opt_by);
averageable!(f64, f64, avg_f64, avg_f64_by);
averageable!(Option<f64>, Option<f64>, avg_f64_opt, avg_f64_opt_by);
