use thiserror::Error;

use crate::{Lease, PoolId};

/// A type-erased error produced by a caller-supplied callback, such as a fallible
/// constructor or destructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when operating on pools.
///
/// An exhausted pool is not an error: acquisition returns `Ok(None)` in that case and the
/// caller is expected to try again later.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A pool was registered without a construct callback.
    #[error("cannot register a pool without a construct callback")]
    InvalidConstruct,

    /// The handle does not refer to a live pool. Either the pool was torn down or the handle
    /// came from a different manager.
    #[error("{pool} is not registered with this manager")]
    UnknownPool {
        /// The pool the operation was addressed to.
        pool: PoolId,
    },

    /// A lease was released that the pool does not consider to be in use.
    ///
    /// This is a bookkeeping bug in the caller and the pool state is left unchanged.
    #[error("cannot release {lease} to {pool}: {reason}")]
    ReleaseViolation {
        /// The pool the lease was released to.
        pool: PoolId,

        /// The offending lease.
        lease: Lease,

        /// Why the release was rejected.
        reason: ViolationReason,
    },

    /// The construct callback failed. The pool was left as it was before the operation.
    #[error("failed to construct an object for {pool}")]
    ConstructionFailed {
        /// The pool that attempted the construction.
        pool: PoolId,

        /// The failure reported by the construct callback.
        #[source]
        source: BoxError,
    },

    /// One or more destroy callbacks failed during teardown.
    ///
    /// Teardown still processed every object; the pool is gone either way.
    #[error("{} of {destroyed} objects of {pool} failed to be destroyed", .failures.len())]
    TeardownFailed {
        /// The pool that was torn down.
        pool: PoolId,

        /// How many objects were processed, including the failed ones.
        destroyed: usize,

        /// The failures reported by the destroy callback, in teardown order.
        failures: Vec<BoxError>,
    },
}

/// Explains why a release was rejected with [`Error::ReleaseViolation`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display)]
#[non_exhaustive]
pub enum ViolationReason {
    /// The object is in the pool but is already on the free list (double release).
    #[display("the object is not in use")]
    NotInUse,

    /// The object was released and leased again since this lease was issued.
    #[display("the lease is stale")]
    Stale,

    /// The lease was issued by a different pool.
    #[display("the lease belongs to another pool")]
    ForeignLease,

    /// The pool does not exist, typically because it was already torn down.
    #[display("the pool is not registered")]
    UnknownPool,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);
    assert_impl_all!(ViolationReason: Send, Sync, Debug, Copy);

    #[test]
    fn release_violation_mentions_reason() {
        let pool = PoolId::new_for_test(7);
        let error = Error::ReleaseViolation {
            pool,
            lease: Lease::new(pool, 3, 0),
            reason: ViolationReason::NotInUse,
        };

        let message = error.to_string();
        assert!(message.contains("pool#7"));
        assert!(message.contains("not in use"));
    }

    #[test]
    fn construction_failure_exposes_source() {
        let error = Error::ConstructionFailed {
            pool: PoolId::new_for_test(1),
            source: "out of textures".into(),
        };

        let source = std::error::Error::source(&error).expect("source is attached");
        assert_eq!(source.to_string(), "out of textures");
    }

    #[test]
    fn teardown_failure_counts_failures() {
        let error = Error::TeardownFailed {
            pool: PoolId::new_for_test(2),
            destroyed: 5,
            failures: vec!["a".into(), "b".into()],
        };

        assert_eq!(
            error.to_string(),
            "2 of 5 objects of pool#2 failed to be destroyed"
        );
    }
}
