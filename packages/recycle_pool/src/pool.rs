use std::any::type_name;
use std::fmt;
use std::mem;
use std::thread;

use crate::{
    BoxError, ConstructCause, ConstructContext, DropPolicy, Error, Lease, PoolId, PoolStats,
    PopulateOptions, Result, ViolationReason, Visibility,
};

pub(crate) type ConstructFn<T, P> =
    Box<dyn FnMut(&ConstructContext<'_, P>) -> std::result::Result<T, BoxError>>;
pub(crate) type ResetFn<T, P> = Box<dyn FnMut(&mut T, &P)>;
pub(crate) type CancelFn<T> = fn(&mut T);
pub(crate) type DestroyFn<T, P> = Box<dyn FnMut(T, &P) -> std::result::Result<(), BoxError>>;

/// The caller-supplied capabilities of one pool.
pub(crate) struct Callbacks<T, P> {
    pub(crate) construct: ConstructFn<T, P>,
    pub(crate) reset: Option<ResetFn<T, P>>,
    pub(crate) cancel: Option<CancelFn<T>>,
    pub(crate) destroy: Option<DestroyFn<T, P>>,
}

impl<T, P> Callbacks<T, P> {
    pub(crate) fn new(construct: ConstructFn<T, P>) -> Self {
        Self {
            construct,
            reset: None,
            cancel: None,
            destroy: None,
        }
    }

    /// Constructs `count` objects or none at all. If any construction fails, the objects
    /// built earlier in the same batch are destroyed before the error is returned.
    fn construct_batch(
        &mut self,
        ctx: &ConstructContext<'_, P>,
        count: usize,
        constructed: &mut u64,
    ) -> std::result::Result<Vec<T>, BoxError> {
        let mut batch = Vec::with_capacity(count);

        for _ in 0..count {
            match (self.construct)(ctx) {
                Ok(object) => {
                    *constructed = constructed.saturating_add(1);
                    batch.push(object);
                }
                Err(error) => {
                    for object in batch {
                        if let Err(destroy_error) = self.destroy_one(object, ctx.params()) {
                            tracing::warn!(
                                error = %destroy_error,
                                "failed to destroy an object discarded after a failed construction"
                            );
                        }
                    }

                    return Err(error);
                }
            }
        }

        Ok(batch)
    }

    fn destroy_one(&mut self, object: T, params: &P) -> std::result::Result<(), BoxError> {
        match self.destroy.as_mut() {
            Some(destroy) => destroy(object, params),
            None => {
                drop(object);
                Ok(())
            }
        }
    }
}

struct Slot<T> {
    object: T,
    in_use: bool,

    /// Bumped on every acquisition, so that leases from earlier acquisitions go stale.
    generation: u64,
}

impl<T> Slot<T> {
    fn is_leased_by(&self, lease: Lease) -> bool {
        self.in_use && self.generation == lease.generation()
    }
}

/// One pool of interchangeable objects of type `T`, built and reset with parameters of type `P`.
///
/// Pools are created and driven through a [`PoolManager`][crate::PoolManager]; this type is the
/// read-only view returned by [`PoolManager::pool()`][crate::PoolManager::pool], useful for
/// inspecting the pool and iterating over the objects that are currently leased.
///
/// Every object the pool constructs stays owned by the pool until the pool is torn down. At
/// any point in time, each object is either on the free list or leased to a caller, never both.
///
/// # Example
///
/// ```
/// use recycle_pool::{PoolManager, PopulateOptions};
///
/// let mut manager = PoolManager::new();
/// let handle = manager.register::<u32, u32>().construct(|ctx| *ctx.params()).build()?;
/// manager.populate(handle, PopulateOptions::new().initial_size(3), 7)?;
///
/// let lease = manager.acquire(handle)?.expect("pool has free objects");
///
/// let pool = manager.pool(handle).expect("pool is registered");
/// assert_eq!(pool.free_len(), 2);
/// assert_eq!(pool.in_use_len(), 1);
/// assert_eq!(pool.get(lease), Some(&7));
/// # Ok::<(), recycle_pool::Error>(())
/// ```
pub struct Pool<T, P> {
    id: PoolId,

    callbacks: Callbacks<T, P>,

    /// Every object tracked by the pool. A slot index is stable for the lifetime of the pool,
    /// as objects only leave the pool when the whole pool is torn down.
    slots: Vec<Slot<T>>,

    /// Indexes of the slots on the free list. Used as a stack, so the most recently released
    /// object is the next one to be handed out.
    free: Vec<usize>,

    /// `None` until the pool is populated for the first time.
    params: Option<P>,

    auto_expand: bool,
    expand_batch: usize,

    drop_policy: DropPolicy,
    debug_mode: bool,

    constructed: u64,
    acquisitions: u64,
    releases: u64,
    expansions: u64,
}

impl<T, P> Pool<T, P> {
    pub(crate) fn new(
        id: PoolId,
        callbacks: Callbacks<T, P>,
        drop_policy: DropPolicy,
        debug_mode: bool,
    ) -> Self {
        Self {
            id,
            callbacks,
            slots: Vec::new(),
            free: Vec::new(),
            params: None,
            auto_expand: false,
            expand_batch: 1,
            drop_policy,
            debug_mode,
            constructed: 0,
            acquisitions: 0,
            releases: 0,
            expansions: 0,
        }
    }

    /// The identifier of the pool.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The number of objects on the free list.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// The number of objects currently leased to callers.
    #[must_use]
    pub fn in_use_len(&self) -> usize {
        self.slots
            .len()
            .checked_sub(self.free.len())
            .expect("the free list only ever refers to objects tracked by the pool")
    }

    /// The number of objects tracked by the pool, free or leased.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool tracks no objects at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether acquisition constructs new objects when the free list is empty.
    #[must_use]
    pub fn is_auto_expand(&self) -> bool {
        self.auto_expand
    }

    /// How many objects are constructed per expansion.
    #[must_use]
    pub fn expand_batch(&self) -> usize {
        self.expand_batch
    }

    /// The parameters from the most recent population, if the pool has been populated.
    #[must_use]
    pub fn params(&self) -> Option<&P> {
        self.params.as_ref()
    }

    /// The drop policy the pool was registered with.
    #[must_use]
    pub fn drop_policy(&self) -> DropPolicy {
        self.drop_policy
    }

    /// A snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free_len(),
            in_use: self.in_use_len(),
            constructed: self.constructed,
            acquisitions: self.acquisitions,
            releases: self.releases,
            expansions: self.expansions,
        }
    }

    /// Whether the lease refers to an object of this pool that is currently leased.
    #[must_use]
    pub fn is_leased(&self, lease: Lease) -> bool {
        self.get(lease).is_some()
    }

    /// The leased object, or `None` if the lease is not live in this pool.
    #[must_use]
    pub fn get(&self, lease: Lease) -> Option<&T> {
        if lease.pool() != self.id {
            return None;
        }

        self.slots
            .get(lease.slot())
            .filter(|slot| slot.is_leased_by(lease))
            .map(|slot| &slot.object)
    }

    /// The leased object, or `None` if the lease is not live in this pool.
    #[must_use]
    pub fn get_mut(&mut self, lease: Lease) -> Option<&mut T> {
        if lease.pool() != self.id {
            return None;
        }

        self.slots
            .get_mut(lease.slot())
            .filter(|slot| slot.is_leased_by(lease))
            .map(|slot| &mut slot.object)
    }

    /// Iterates over the leased objects, in the order they were first constructed.
    pub fn in_use(&self) -> impl Iterator<Item = (Lease, &T)> {
        let id = self.id;

        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.in_use)
            .map(move |(index, slot)| (Lease::new(id, index, slot.generation), &slot.object))
    }

    pub(crate) fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    /// Constructs the initial objects and records the growth settings and parameters.
    ///
    /// Repeated population adds more objects; the latest settings and parameters replace the
    /// earlier ones. On failure, nothing about the pool changes.
    pub(crate) fn populate(&mut self, options: PopulateOptions, params: P) -> Result<()> {
        let id = self.id;

        let ctx = ConstructContext::new(
            &params,
            options.visibility_value(),
            ConstructCause::Populate,
        );
        let batch = self
            .callbacks
            .construct_batch(&ctx, options.initial_size_value(), &mut self.constructed)
            .map_err(|source| Error::ConstructionFailed { pool: id, source })?;

        self.params = Some(params);
        self.auto_expand = options.is_auto_expand();
        self.expand_batch = options.expand_batch();

        self.free.reserve(batch.len());

        for object in batch {
            let index = self.track(object, false);
            self.free.push(index);
        }

        self.trace("populated");
        Ok(())
    }

    /// Leases an object, expanding the pool if it is allowed to.
    ///
    /// Returns `Ok(None)` if the free list is empty and the pool may not expand.
    pub(crate) fn acquire(&mut self, visibility: Visibility) -> Result<Option<Lease>> {
        if let Some(index) = self.free.pop() {
            let slot = self
                .slots
                .get_mut(index)
                .expect("the free list only ever refers to objects tracked by the pool");

            debug_assert!(!slot.in_use, "object on the free list was marked as in use");
            slot.in_use = true;
            slot.generation = slot.generation.wrapping_add(1);
            let lease = Lease::new(self.id, index, slot.generation);

            self.acquisitions = self.acquisitions.saturating_add(1);
            self.trace("acquired");
            return Ok(Some(lease));
        }

        if !self.auto_expand {
            self.trace("exhausted");
            return Ok(None);
        }

        // Expansion is only enabled by population, which also sets the parameters.
        let Some(params) = self.params.as_ref() else {
            return Ok(None);
        };

        let id = self.id;

        let ctx = ConstructContext::new(params, visibility, ConstructCause::Expand);
        let mut batch = self
            .callbacks
            .construct_batch(&ctx, self.expand_batch, &mut self.constructed)
            .map_err(|source| Error::ConstructionFailed { pool: id, source })?;

        let leased = batch
            .pop()
            .expect("expansion always constructs at least one object");

        for object in batch {
            let index = self.track(object, false);
            self.free.push(index);
        }

        let index = self.track(leased, true);

        self.acquisitions = self.acquisitions.saturating_add(1);
        self.expansions = self.expansions.saturating_add(1);
        self.trace("expanded");
        Ok(Some(Lease::new(id, index, 0)))
    }

    /// Cancels pending work on the object, resets it and puts it back on the free list.
    pub(crate) fn release(&mut self, lease: Lease) -> Result<()> {
        let id = self.id;

        if lease.pool() != id {
            return Err(Error::ReleaseViolation {
                pool: id,
                lease,
                reason: ViolationReason::ForeignLease,
            });
        }

        let Some(slot) = self.slots.get_mut(lease.slot()) else {
            return Err(Error::ReleaseViolation {
                pool: id,
                lease,
                reason: ViolationReason::NotInUse,
            });
        };

        if !slot.in_use {
            return Err(Error::ReleaseViolation {
                pool: id,
                lease,
                reason: ViolationReason::NotInUse,
            });
        }

        if slot.generation != lease.generation() {
            return Err(Error::ReleaseViolation {
                pool: id,
                lease,
                reason: ViolationReason::Stale,
            });
        }

        if let Some(cancel) = self.callbacks.cancel {
            cancel(&mut slot.object);
        }

        if let (Some(reset), Some(params)) = (self.callbacks.reset.as_mut(), self.params.as_ref()) {
            reset(&mut slot.object, params);
        }

        slot.in_use = false;
        self.free.push(lease.slot());

        self.releases = self.releases.saturating_add(1);
        self.trace("released");
        Ok(())
    }

    /// Destroys every tracked object, leased or not, and returns how many there were.
    ///
    /// A failing destroy callback does not stop the teardown; all failures are collected and
    /// returned together once every object has been processed.
    pub(crate) fn teardown(&mut self) -> Result<usize> {
        let (destroyed, failures) = self.destroy_all();

        if self.debug_mode {
            tracing::debug!(
                pool = %self.id,
                destroyed,
                failed = failures.len(),
                "torn down"
            );
        }

        if failures.is_empty() {
            Ok(destroyed)
        } else {
            Err(Error::TeardownFailed {
                pool: self.id,
                destroyed,
                failures,
            })
        }
    }

    fn track(&mut self, object: T, in_use: bool) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot {
            object,
            in_use,
            generation: 0,
        });
        index
    }

    fn destroy_all(&mut self) -> (usize, Vec<BoxError>) {
        self.free.clear();
        let slots = mem::take(&mut self.slots);
        let destroyed = slots.len();

        let mut failures = Vec::new();

        for slot in slots {
            // Objects can only exist once the pool was populated, so parameters are present.
            let result = match self.params.as_ref() {
                Some(params) => self.callbacks.destroy_one(slot.object, params),
                None => {
                    drop(slot.object);
                    Ok(())
                }
            };

            if let Err(error) = result {
                tracing::warn!(pool = %self.id, error = %error, "failed to destroy pooled object");
                failures.push(error);
            }
        }

        (destroyed, failures)
    }

    fn trace(&self, event: &'static str) {
        if self.debug_mode {
            tracing::debug!(
                pool = %self.id,
                free = self.free_len(),
                in_use = self.in_use_len(),
                constructed = self.constructed,
                "{event}"
            );
        }
    }
}

impl<T, P> fmt::Debug for Pool<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("params_type", &format_args!("{}", type_name::<P>()))
            .field("free", &self.free_len())
            .field("in_use", &self.in_use_len())
            .field("auto_expand", &self.auto_expand)
            .field("expand_batch", &self.expand_batch)
            .field("drop_policy", &self.drop_policy)
            .field("debug_mode", &self.debug_mode)
            .finish_non_exhaustive()
    }
}

impl<T, P> Drop for Pool<T, P> {
    fn drop(&mut self) {
        if self.slots.is_empty() {
            return;
        }

        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            let in_use = self.in_use_len();

            assert!(
                in_use == 0,
                "dropped {} with {in_use} leased objects - this is forbidden by DropPolicy::MustNotDropItems",
                self.id
            );
        }

        let (destroyed, failures) = self.destroy_all();

        if !failures.is_empty() {
            tracing::warn!(
                pool = %self.id,
                destroyed,
                failed = failures.len(),
                "dropped pool with objects that failed to be destroyed"
            );
        }
    }
}
