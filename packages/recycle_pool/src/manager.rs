use std::any::{Any, type_name};
use std::fmt;

use foldhash::{HashMap, HashMapExt};

use crate::pool::Callbacks;
use crate::{
    DropPolicy, Error, Lease, Pool, PoolBuilder, PoolHandle, PoolId, PoolStats, PopulateOptions,
    Result, ViolationReason, Visibility,
};

/// The operations the manager needs to perform on a pool without knowing its types.
trait ErasedPool {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn set_debug_mode(&mut self, enabled: bool);
    fn teardown(&mut self) -> Result<usize>;
}

impl<T, P> ErasedPool for Pool<T, P>
where
    T: 'static,
    P: 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_debug_mode(&mut self, enabled: bool) {
        Pool::set_debug_mode(self, enabled);
    }

    fn teardown(&mut self) -> Result<usize> {
        Pool::teardown(self)
    }
}

/// A registry of independently configured object pools.
///
/// Each pool recycles objects of one type, built by a caller-supplied construct callback and
/// scrubbed by an optional reset callback whenever an object is released. Pools of different
/// object types can live in the same manager; [`PoolHandle`]s keep every operation typed.
///
/// The manager is a plain value owned by whichever component needs pooling. There is no global
/// registry, so independent managers do not interfere with each other.
///
/// # Lifecycle
///
/// 1. [`register()`](Self::register) a pool, which starts out empty.
/// 2. [`populate()`](Self::populate) it with its initial objects and growth settings.
/// 3. [`acquire()`](Self::acquire) and [`release()`](Self::release) objects as needed.
/// 4. [`teardown()`](Self::teardown) the pool to destroy every object it tracks.
///
/// Dropping the manager tears down all remaining pools, subject to their [`DropPolicy`].
///
/// # Thread safety
///
/// The manager is single-threaded: it is neither [`Send`] nor [`Sync`], as the callbacks it
/// holds are not required to be either. Every operation runs to completion on the calling
/// thread.
///
/// # Example
///
/// ```
/// use recycle_pool::{PoolManager, PopulateOptions};
///
/// let mut manager = PoolManager::new();
///
/// let hearts = manager
///     .register::<String, &'static str>()
///     .construct(|ctx| ctx.params().to_string())
///     .reset(|label, id| {
///         label.clear();
///         label.push_str(id);
///     })
///     .build()?;
///
/// manager.populate(hearts, PopulateOptions::new().initial_size(2), "heart")?;
///
/// let first = manager.acquire(hearts)?.expect("two objects are free");
/// let second = manager.acquire(hearts)?.expect("one object is free");
/// assert_eq!(manager.acquire(hearts)?, None);
///
/// manager.object_mut(hearts, first).expect("leased").push_str(" (selected)");
/// manager.release(hearts, first)?;
/// manager.release(hearts, second)?;
///
/// assert_eq!(manager.teardown(hearts)?, 2);
/// assert!(!manager.contains(hearts));
/// # Ok::<(), recycle_pool::Error>(())
/// ```
pub struct PoolManager {
    pools: HashMap<PoolId, Box<dyn ErasedPool>>,

    debug_mode: bool,
}

impl PoolManager {
    /// Creates a manager with no pools and debug mode disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            debug_mode: false,
        }
    }

    /// Starts registering a new pool of `T` objects, parameterized by `P`.
    ///
    /// Use `()` as `P` if the callbacks need no parameters.
    pub fn register<T, P>(&mut self) -> PoolBuilder<'_, T, P>
    where
        T: 'static,
        P: 'static,
    {
        PoolBuilder::new(self)
    }

    pub(crate) fn insert_pool<T, P>(
        &mut self,
        callbacks: Callbacks<T, P>,
        drop_policy: DropPolicy,
    ) -> PoolHandle<T, P>
    where
        T: 'static,
        P: 'static,
    {
        let id = PoolId::next();

        self.pools.insert(
            id,
            Box::new(Pool::new(id, callbacks, drop_policy, self.debug_mode)),
        );

        if self.debug_mode {
            tracing::debug!(pool = %id, item_type = type_name::<T>(), "registered");
        }

        PoolHandle::new(id)
    }

    /// Constructs `options.initial_size` objects and places them on the free list, recording
    /// the growth settings and parameters of the pool.
    ///
    /// The parameters are handed to every later construct, reset and destroy callback of the
    /// pool. Populating a pool more than once adds objects; the most recent settings and
    /// parameters replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPool`] if the pool is not registered and
    /// [`Error::ConstructionFailed`] if the construct callback fails, in which case the pool is
    /// left unchanged.
    pub fn populate<T, P>(
        &mut self,
        handle: PoolHandle<T, P>,
        options: PopulateOptions,
        params: P,
    ) -> Result<()>
    where
        T: 'static,
        P: 'static,
    {
        self.typed_mut(handle)?.populate(options, params)
    }

    /// Leases an object from the pool.
    ///
    /// Objects are handed out most-recently-released first. If the free list is empty and the
    /// pool was populated with auto-expansion enabled, new objects are constructed on demand.
    ///
    /// Returns `Ok(None)` if the pool is exhausted and may not grow. This is an expected
    /// outcome; the caller should try again later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPool`] if the pool is not registered and
    /// [`Error::ConstructionFailed`] if an expansion fails.
    pub fn acquire<T, P>(&mut self, handle: PoolHandle<T, P>) -> Result<Option<Lease>>
    where
        T: 'static,
        P: 'static,
    {
        self.typed_mut(handle)?.acquire(Visibility::Immediate)
    }

    /// Leases an object the caller intends to keep hidden until it flips its own visibility
    /// flag.
    ///
    /// The pool enforces nothing: objects from the free list are returned as they are, and
    /// objects constructed by an expansion see [`Visibility::Deferred`] in their construct
    /// context.
    ///
    /// # Errors
    ///
    /// Same as [`acquire()`](Self::acquire).
    pub fn acquire_deferred<T, P>(&mut self, handle: PoolHandle<T, P>) -> Result<Option<Lease>>
    where
        T: 'static,
        P: 'static,
    {
        self.typed_mut(handle)?.acquire(Visibility::Deferred)
    }

    /// Returns a leased object to the pool.
    ///
    /// If the pool opted into [`Cancellable`][crate::Cancellable], pending work on the object
    /// is cancelled first. Then the reset callback (if any) runs with the pool parameters, and
    /// the object goes back on top of the free list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReleaseViolation`] if the lease is not currently in use in this pool:
    /// it was already released, the object has since been leased again under a newer lease,
    /// it belongs to another pool, or the pool was torn down. The pool is left unchanged.
    pub fn release<T, P>(&mut self, handle: PoolHandle<T, P>, lease: Lease) -> Result<()>
    where
        T: 'static,
        P: 'static,
    {
        let Some(pool) = self.typed_pool_mut(handle) else {
            return Err(Error::ReleaseViolation {
                pool: handle.id(),
                lease,
                reason: ViolationReason::UnknownPool,
            });
        };

        pool.release(lease)
    }

    /// Destroys every object tracked by the pool, leased or free, and unregisters the pool.
    ///
    /// Returns the number of objects destroyed. Tearing down a pool that is not registered
    /// (for example because it was already torn down) does nothing and returns `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TeardownFailed`] if the destroy callback failed for some objects. The
    /// remaining objects are still destroyed and the pool is unregistered regardless.
    pub fn teardown<T, P>(&mut self, handle: PoolHandle<T, P>) -> Result<usize> {
        let Some(mut pool) = self.pools.remove(&handle.id()) else {
            if self.debug_mode {
                tracing::debug!(pool = %handle.id(), "ignored teardown of unknown pool");
            }

            return Ok(0);
        };

        pool.teardown()
    }

    /// Tears down every registered pool, in registration order.
    ///
    /// Returns the total number of objects destroyed.
    ///
    /// # Errors
    ///
    /// If any pool fails to tear down cleanly, every pool is still torn down and the first
    /// failure is returned. All failures are logged as they happen.
    pub fn teardown_all(&mut self) -> Result<usize> {
        let mut pools = self.pools.drain().collect::<Vec<_>>();
        pools.sort_unstable_by_key(|(id, _)| *id);

        let mut destroyed = 0_usize;
        let mut first_error = None;

        for (_, mut pool) in pools {
            match pool.teardown() {
                Ok(count) => destroyed = destroyed.saturating_add(count),
                Err(error) => {
                    if let Error::TeardownFailed { destroyed: count, .. } = &error {
                        destroyed = destroyed.saturating_add(*count);
                    }

                    first_error.get_or_insert(error);
                }
            }
        }

        first_error.map_or(Ok(destroyed), Err)
    }

    /// The leased object, or `None` if the lease is not live in the pool.
    #[must_use]
    pub fn object<T, P>(&self, handle: PoolHandle<T, P>, lease: Lease) -> Option<&T>
    where
        T: 'static,
        P: 'static,
    {
        self.pool(handle)?.get(lease)
    }

    /// The leased object, or `None` if the lease is not live in the pool.
    #[must_use]
    pub fn object_mut<T, P>(&mut self, handle: PoolHandle<T, P>, lease: Lease) -> Option<&mut T>
    where
        T: 'static,
        P: 'static,
    {
        self.typed_pool_mut(handle)?.get_mut(lease)
    }

    /// A read-only view of the pool, or `None` if it is not registered.
    #[must_use]
    pub fn pool<T, P>(&self, handle: PoolHandle<T, P>) -> Option<&Pool<T, P>>
    where
        T: 'static,
        P: 'static,
    {
        self.pools
            .get(&handle.id())
            .and_then(|pool| pool.as_any().downcast_ref())
    }

    /// Counters describing the pool, or `None` if it is not registered.
    #[must_use]
    pub fn stats<T, P>(&self, handle: PoolHandle<T, P>) -> Option<PoolStats>
    where
        T: 'static,
        P: 'static,
    {
        self.pool(handle).map(Pool::stats)
    }

    /// Whether the pool is registered with this manager.
    #[must_use]
    pub fn contains<T, P>(&self, handle: PoolHandle<T, P>) -> bool {
        self.pools.contains_key(&handle.id())
    }

    /// The number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Enables or disables diagnostics for every pool of this manager.
    ///
    /// While enabled, every registration, population, acquisition, release, expansion and
    /// teardown emits a `tracing` event at debug level with the pool identifier and its free
    /// and in-use counts. This never changes the behavior of any operation.
    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;

        for pool in self.pools.values_mut() {
            pool.set_debug_mode(enabled);
        }
    }

    /// Whether diagnostics are enabled.
    #[must_use]
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    fn typed_pool_mut<T, P>(&mut self, handle: PoolHandle<T, P>) -> Option<&mut Pool<T, P>>
    where
        T: 'static,
        P: 'static,
    {
        self.pools
            .get_mut(&handle.id())
            .and_then(|pool| pool.as_any_mut().downcast_mut())
    }

    fn typed_mut<T, P>(&mut self, handle: PoolHandle<T, P>) -> Result<&mut Pool<T, P>>
    where
        T: 'static,
        P: 'static,
    {
        self.typed_pool_mut(handle)
            .ok_or_else(|| Error::UnknownPool { pool: handle.id() })
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids = self.pools.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();

        f.debug_struct("PoolManager")
            .field("pools", &ids)
            .field("debug_mode", &self.debug_mode)
            .finish()
    }
}
