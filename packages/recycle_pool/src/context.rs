/// Whether the caller wants the externally observable effects of an object to be withheld.
///
/// The pool never acts on this value itself. It is passed through to the construct callback
/// so that objects built during a deferred acquisition (or a deferred population) can start
/// out hidden. Objects taken from the free list are handed out as-is, and the caller is
/// expected to flip its own visibility flag once it is ready for the object to be seen.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Visibility {
    /// Construction side effects may become observable immediately. This is the default.
    #[default]
    Immediate,

    /// The caller will make the object observable later.
    Deferred,
}

impl Visibility {
    /// Whether this is [`Visibility::Deferred`].
    #[must_use]
    pub fn is_deferred(self) -> bool {
        matches!(self, Self::Deferred)
    }
}

/// Why the construct callback is being invoked.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ConstructCause {
    /// The pool is being pre-filled by [`PoolManager::populate()`][crate::PoolManager::populate].
    Populate,

    /// The free list was empty during acquisition and the pool is allowed to grow.
    Expand,
}

/// Everything the construct callback gets to know about the object it is building.
///
/// # Example
///
/// ```
/// use recycle_pool::{ConstructCause, PoolManager, PopulateOptions};
///
/// let mut manager = PoolManager::new();
/// let handle = manager
///     .register::<(String, bool), &'static str>()
///     .construct(|ctx| {
///         assert_eq!(ctx.cause(), ConstructCause::Populate);
///         (ctx.params().to_string(), ctx.visibility().is_deferred())
///     })
///     .build()?;
///
/// manager.populate(handle, PopulateOptions::new().initial_size(1), "heart")?;
/// # Ok::<(), recycle_pool::Error>(())
/// ```
#[derive(Debug)]
pub struct ConstructContext<'a, P> {
    params: &'a P,
    visibility: Visibility,
    cause: ConstructCause,
}

impl<'a, P> ConstructContext<'a, P> {
    pub(crate) fn new(params: &'a P, visibility: Visibility, cause: ConstructCause) -> Self {
        Self {
            params,
            visibility,
            cause,
        }
    }

    /// The parameters the pool was populated with.
    #[must_use]
    pub fn params(&self) -> &'a P {
        self.params
    }

    /// Whether the new object should start out hidden.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// What triggered the construction.
    #[must_use]
    pub fn cause(&self) -> ConstructCause {
        self.cause
    }
}

/// Implemented by pooled types that may own outstanding asynchronous work (timers, scheduled
/// transitions, completion callbacks) which must not outlive a single use of the object.
///
/// A pool only calls this if it was registered with
/// [`PoolBuilder::cancel_pending()`][crate::PoolBuilder::cancel_pending]. When enabled, the
/// cancellation runs on every release, before the reset callback.
///
/// # Example
///
/// ```
/// use recycle_pool::Cancellable;
///
/// struct Sprite {
///     pending_transitions: Vec<u32>,
/// }
///
/// impl Cancellable for Sprite {
///     fn cancel_pending(&mut self) {
///         self.pending_transitions.clear();
///     }
/// }
/// ```
pub trait Cancellable {
    /// Cancels any in-flight work attached to the object.
    fn cancel_pending(&mut self);
}
