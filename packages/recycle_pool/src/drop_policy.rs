/// Determines what happens to leased objects when a pool is dropped without being torn down,
/// for example because its [`PoolManager`][crate::PoolManager] went out of scope.
///
/// Explicit teardown via [`PoolManager::teardown()`][crate::PoolManager::teardown] always
/// destroys every object, leased or not, regardless of the policy.
///
/// # Examples
///
/// ```
/// use recycle_pool::{DropPolicy, PoolManager};
///
/// let mut manager = PoolManager::new();
/// let handle = manager
///     .register::<Vec<u8>, ()>()
///     .construct(|_| Vec::with_capacity(1024))
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build()?;
/// # Ok::<(), recycle_pool::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool will destroy all of its objects when dropped, including leased ones.
    /// This is the default.
    #[default]
    MayDropItems,

    /// The pool will panic if any of its objects are still leased when it is dropped.
    ///
    /// This may be valuable if callers keep out of band references to leased objects (for
    /// example registered with a scene graph) that must be released before the objects go away.
    MustNotDropItems,
}
