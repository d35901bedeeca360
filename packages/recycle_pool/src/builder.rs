use std::any::type_name;
use std::fmt;

use crate::pool::{Callbacks, ConstructFn, DestroyFn, ResetFn};
use crate::{
    BoxError, Cancellable, ConstructContext, DropPolicy, Error, PoolHandle, PoolManager, Result,
};

/// Builder for registering a new pool with a [`PoolManager`].
///
/// Obtained from [`PoolManager::register()`]. A construct callback is mandatory, set via either
/// [`construct()`](Self::construct) or [`try_construct()`](Self::try_construct); all other
/// settings are optional. The pool is created empty by [`build()`](Self::build) and is
/// filled by [`PoolManager::populate()`].
///
/// # Examples
///
/// ```
/// use recycle_pool::{PoolManager, PopulateOptions};
///
/// #[derive(Default)]
/// struct Particle {
///     x: f32,
///     y: f32,
///     color: &'static str,
/// }
///
/// let mut manager = PoolManager::new();
///
/// let particles = manager
///     .register::<Particle, &'static str>()
///     .construct(|ctx| Particle {
///         color: *ctx.params(),
///         ..Particle::default()
///     })
///     .reset(|particle, color| {
///         particle.x = 0.0;
///         particle.y = 0.0;
///         particle.color = *color;
///     })
///     .build()?;
///
/// manager.populate(particles, PopulateOptions::new().initial_size(8), "red")?;
/// # Ok::<(), recycle_pool::Error>(())
/// ```
#[must_use]
pub struct PoolBuilder<'m, T, P> {
    manager: &'m mut PoolManager,

    construct: Option<ConstructFn<T, P>>,
    reset: Option<ResetFn<T, P>>,
    cancel: Option<fn(&mut T)>,
    destroy: Option<DestroyFn<T, P>>,
    drop_policy: DropPolicy,
}

impl<T, P> fmt::Debug for PoolBuilder<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("params_type", &format_args!("{}", type_name::<P>()))
            .field("has_construct", &self.construct.is_some())
            .field("has_reset", &self.reset.is_some())
            .field("has_cancel", &self.cancel.is_some())
            .field("has_destroy", &self.destroy.is_some())
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}

impl<'m, T, P> PoolBuilder<'m, T, P>
where
    T: 'static,
    P: 'static,
{
    pub(crate) fn new(manager: &'m mut PoolManager) -> Self {
        Self {
            manager,
            construct: None,
            reset: None,
            cancel: None,
            destroy: None,
            drop_policy: DropPolicy::default(),
        }
    }

    /// Sets an infallible construct callback.
    ///
    /// The callback receives the pool parameters and the [`Visibility`][crate::Visibility]
    /// requested by the operation that triggered the construction.
    pub fn construct<F>(mut self, mut construct: F) -> Self
    where
        F: FnMut(&ConstructContext<'_, P>) -> T + 'static,
    {
        self.construct = Some(Box::new(move |ctx: &ConstructContext<'_, P>| {
            Ok::<T, BoxError>(construct(ctx))
        }));
        self
    }

    /// Sets a fallible construct callback.
    ///
    /// A failure is reported to the caller of the operation that triggered the construction
    /// as [`Error::ConstructionFailed`], and the pool is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use recycle_pool::{Error, PoolManager, PopulateOptions};
    ///
    /// let mut manager = PoolManager::new();
    /// let handle = manager
    ///     .register::<Vec<u8>, usize>()
    ///     .try_construct(|ctx| {
    ///         if *ctx.params() > 4096 {
    ///             return Err("buffer too large");
    ///         }
    ///
    ///         Ok(Vec::with_capacity(*ctx.params()))
    ///     })
    ///     .build()?;
    ///
    /// let result = manager.populate(handle, PopulateOptions::new().initial_size(2), 10_000);
    /// assert!(matches!(result, Err(Error::ConstructionFailed { .. })));
    /// # Ok::<(), recycle_pool::Error>(())
    /// ```
    pub fn try_construct<F, E>(mut self, mut construct: F) -> Self
    where
        F: FnMut(&ConstructContext<'_, P>) -> std::result::Result<T, E> + 'static,
        E: Into<BoxError>,
    {
        self.construct = Some(Box::new(move |ctx: &ConstructContext<'_, P>| {
            construct(ctx).map_err(Into::<BoxError>::into)
        }));
        self
    }

    /// Sets a callback that scrubs per-use state from an object on release, before it returns
    /// to the free list. Without one, released objects are requeued as they are.
    pub fn reset<F>(mut self, reset: F) -> Self
    where
        F: FnMut(&mut T, &P) + 'static,
    {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Makes the pool call [`Cancellable::cancel_pending()`] on every released object, before
    /// the reset callback.
    pub fn cancel_pending(mut self) -> Self
    where
        T: Cancellable,
    {
        let cancel: fn(&mut T) = <T as Cancellable>::cancel_pending;
        self.cancel = Some(cancel);
        self
    }

    /// Sets an infallible callback that disposes of an object when the pool is torn down.
    /// Without one, objects are simply dropped.
    pub fn destroy<F>(mut self, mut destroy: F) -> Self
    where
        F: FnMut(T, &P) + 'static,
    {
        self.destroy = Some(Box::new(move |object: T, params: &P| {
            destroy(object, params);
            Ok::<(), BoxError>(())
        }));
        self
    }

    /// Sets a fallible callback that disposes of an object when the pool is torn down.
    ///
    /// Failures do not stop the teardown. They are collected and reported together as
    /// [`Error::TeardownFailed`] once every object has been processed.
    pub fn try_destroy<F, E>(mut self, mut destroy: F) -> Self
    where
        F: FnMut(T, &P) -> std::result::Result<(), E> + 'static,
        E: Into<BoxError>,
    {
        self.destroy = Some(Box::new(move |object: T, params: &P| {
            destroy(object, params).map_err(Into::<BoxError>::into)
        }));
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat leased
    /// objects if the pool is dropped without being torn down.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Registers the pool with the manager and returns its handle.
    ///
    /// The new pool is empty. Use [`PoolManager::populate()`] to construct its initial objects
    /// and configure its growth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConstruct`] if no construct callback was set. No pool is
    /// registered in that case.
    pub fn build(self) -> Result<PoolHandle<T, P>> {
        let construct = self.construct.ok_or(Error::InvalidConstruct)?;

        let mut callbacks = Callbacks::new(construct);
        callbacks.reset = self.reset;
        callbacks.cancel = self.cancel;
        callbacks.destroy = self.destroy;

        Ok(self.manager.insert_pool(callbacks, self.drop_policy))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PoolBuilder<'static, String, ()>: fmt::Debug);

    struct Timer {
        pending: u32,
    }

    impl Cancellable for Timer {
        fn cancel_pending(&mut self) {
            self.pending = 0;
        }
    }

    #[test]
    fn register_without_construct_fails() {
        let mut manager = PoolManager::new();

        let result = manager.register::<String, ()>().build();

        assert!(matches!(result, Err(Error::InvalidConstruct)));
        assert!(manager.is_empty());
    }

    #[test]
    fn register_without_construct_fails_even_with_other_callbacks() {
        let mut manager = PoolManager::new();

        let result = manager
            .register::<String, ()>()
            .reset(|value, ()| value.clear())
            .destroy(|_, ()| {})
            .build();

        assert!(matches!(result, Err(Error::InvalidConstruct)));
        assert!(manager.is_empty());
    }

    #[test]
    fn register_creates_empty_pool() {
        let mut manager = PoolManager::new();

        let handle = manager
            .register::<String, ()>()
            .construct(|_| String::new())
            .build()
            .unwrap();

        assert!(manager.contains(handle));
        assert_eq!(manager.len(), 1);
        assert!(manager.stats(handle).unwrap().is_empty());
    }

    #[test]
    fn drop_policy_is_recorded() {
        let mut manager = PoolManager::new();

        let handle = manager
            .register::<String, ()>()
            .construct(|_| String::new())
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        assert_eq!(
            manager.pool(handle).unwrap().drop_policy(),
            DropPolicy::MustNotDropItems
        );
    }

    #[test]
    fn cancel_pending_is_applied_on_release() {
        let mut manager = PoolManager::new();

        let handle = manager
            .register::<Timer, ()>()
            .construct(|_| Timer { pending: 0 })
            .cancel_pending()
            .build()
            .unwrap();
        manager
            .populate(handle, crate::PopulateOptions::new().initial_size(1), ())
            .unwrap();

        let lease = manager.acquire(handle).unwrap().unwrap();
        manager.object_mut(handle, lease).unwrap().pending = 3;
        manager.release(handle, lease).unwrap();

        let lease = manager.acquire(handle).unwrap().unwrap();
        assert_eq!(manager.object(handle, lease).unwrap().pending, 0);
    }

    #[test]
    fn last_construct_wins() {
        let mut manager = PoolManager::new();

        let handle = manager
            .register::<u32, ()>()
            .construct(|_| 1)
            .try_construct(|_| Ok::<_, BoxError>(2))
            .build()
            .unwrap();
        manager
            .populate(handle, crate::PopulateOptions::new().initial_size(1), ())
            .unwrap();

        let lease = manager.acquire(handle).unwrap().unwrap();
        assert_eq!(manager.object(handle, lease), Some(&2));
    }

    #[test]
    fn builder_debug_lists_capabilities() {
        let mut manager = PoolManager::new();
        let builder = manager.register::<String, ()>().construct(|_| String::new());

        let output = format!("{builder:?}");
        assert!(output.contains("has_construct: true"));
        assert!(output.contains("has_reset: false"));
    }
}
