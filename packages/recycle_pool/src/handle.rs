use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of pool identifiers. Shared by every manager in the process so that a handle or
/// lease from one manager can never be mistaken for one issued by another.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one pool for its entire lifetime.
///
/// Identifiers are never reused within a process, so an identifier that refers to a torn
/// down pool stays dead forever.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display)]
#[display("pool#{_0}")]
pub struct PoolId(u64);

impl PoolId {
    pub(crate) fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(value: u64) -> Self {
        Self(value)
    }
}

/// A typed reference to a pool registered with a [`PoolManager`][crate::PoolManager].
///
/// The type parameters record the pooled object type `T` and the parameter type `P` of the
/// pool, so every operation performed through the handle is statically typed. Handles are
/// cheap to copy; copies refer to the same pool.
///
/// A handle stays valid until the pool is torn down. After that, operations addressed to it
/// fail with [`Error::UnknownPool`][crate::Error::UnknownPool] (or a release violation).
///
/// # Example
///
/// ```
/// use recycle_pool::{PoolManager, PopulateOptions};
///
/// let mut manager = PoolManager::new();
/// let handle = manager.register::<String, ()>().construct(|_| String::new()).build()?;
///
/// let copy = handle;
/// manager.populate(copy, PopulateOptions::new().initial_size(2), ())?;
///
/// assert_eq!(manager.stats(handle).map(|s| s.free), Some(2));
/// # Ok::<(), recycle_pool::Error>(())
/// ```
pub struct PoolHandle<T, P> {
    id: PoolId,

    _types: PhantomData<fn() -> (T, P)>,
}

impl<T, P> PoolHandle<T, P> {
    pub(crate) fn new(id: PoolId) -> Self {
        Self {
            id,
            _types: PhantomData,
        }
    }

    /// The identifier of the pool this handle refers to.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.id
    }
}

impl<T, P> Clone for PoolHandle<T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P> Copy for PoolHandle<T, P> {}

impl<T, P> PartialEq for PoolHandle<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T, P> Eq for PoolHandle<T, P> {}

impl<T, P> Hash for PoolHandle<T, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T, P> fmt::Debug for PoolHandle<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("id", &self.id)
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("params_type", &format_args!("{}", type_name::<P>()))
            .finish()
    }
}

/// Proof that one pooled object is checked out to the caller.
///
/// A lease is returned by a successful acquisition and is handed back on release. Leases are
/// plain values that can be copied, so the pool cannot stop a caller from releasing the same
/// lease twice; it detects it instead and reports a
/// [`ReleaseViolation`][crate::Error::ReleaseViolation].
///
/// Every acquisition of an object issues a lease of a new generation. A copy kept from an
/// earlier acquisition of the same object is stale and is rejected even while the object is
/// leased to someone else.
///
/// While the lease is live, the object is reachable via
/// [`PoolManager::object()`][crate::PoolManager::object] and
/// [`PoolManager::object_mut()`][crate::PoolManager::object_mut].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, derive_more::Display)]
#[display("lease#{slot} of {pool}")]
pub struct Lease {
    pool: PoolId,
    slot: usize,
    generation: u64,
}

impl Lease {
    pub(crate) fn new(pool: PoolId, slot: usize, generation: u64) -> Self {
        Self {
            pool,
            slot,
            generation,
        }
    }

    /// The pool that issued this lease.
    #[must_use]
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PoolId: Send, Sync, Copy, fmt::Debug, fmt::Display);
    assert_impl_all!(Lease: Send, Sync, Copy, fmt::Debug, fmt::Display);

    // The handle does not hold any T or P, so it stays Copy and thread-mobile even for
    // pooled types that are neither.
    assert_impl_all!(PoolHandle<Rc<Cell<u32>>, Vec<String>>: Send, Sync, Copy, fmt::Debug);

    #[test]
    fn ids_are_unique() {
        let first = PoolId::next();
        let second = PoolId::next();

        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn handle_debug_names_types() {
        let handle = PoolHandle::<String, u8>::new(PoolId::new_for_test(3));
        let output = format!("{handle:?}");

        assert!(output.contains("String"));
        assert!(output.contains("u8"));
    }

    #[test]
    fn lease_display() {
        let lease = Lease::new(PoolId::new_for_test(4), 9, 2);

        assert_eq!(lease.to_string(), "lease#9 of pool#4");
        assert_eq!(lease.pool(), PoolId::new_for_test(4));
        assert_eq!(lease.slot(), 9);
        assert_eq!(lease.generation(), 2);
    }

    #[test]
    fn leases_of_different_generations_differ() {
        let pool = PoolId::new_for_test(5);

        assert_ne!(Lease::new(pool, 0, 0), Lease::new(pool, 0, 1));
    }
}
