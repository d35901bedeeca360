use crate::Visibility;

/// Sizing and growth settings applied by [`PoolManager::populate()`][crate::PoolManager::populate].
///
/// Every setting is optional. The defaults describe an empty, fixed-size pool: no objects are
/// constructed up front and acquisition from an empty free list returns `Ok(None)`.
///
/// # Examples
///
/// ```
/// use recycle_pool::{PopulateOptions, Visibility};
///
/// let options = PopulateOptions::new()
///     .initial_size(16)
///     .auto_expand(true)
///     .expand_step(4)
///     .visibility(Visibility::Deferred);
///
/// assert_eq!(options.initial_size_value(), 16);
/// assert_eq!(options.expand_batch(), 4);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[must_use]
pub struct PopulateOptions {
    initial_size: usize,
    expand_step: usize,
    auto_expand: bool,
    visibility: Visibility,
}

impl PopulateOptions {
    /// Creates options describing an empty, fixed-size pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many objects to construct immediately.
    pub fn initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    /// Sets how many objects to construct each time an acquisition finds the free list empty.
    ///
    /// Only meaningful together with [`auto_expand(true)`][Self::auto_expand]. Both `0` and `1`
    /// mean that exactly one object is constructed per expansion.
    pub fn expand_step(mut self, expand_step: usize) -> Self {
        self.expand_step = expand_step;
        self
    }

    /// Sets whether acquisition may construct new objects when the free list is empty.
    pub fn auto_expand(mut self, auto_expand: bool) -> Self {
        self.auto_expand = auto_expand;
        self
    }

    /// Sets the visibility passed to the construct callback for the initial objects.
    ///
    /// Use [`Visibility::Deferred`] when construction has observable side effects that must
    /// not happen until the caller actually uses an object.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// The number of objects constructed immediately.
    #[must_use]
    pub fn initial_size_value(&self) -> usize {
        self.initial_size
    }

    /// Whether the pool may grow on demand.
    #[must_use]
    pub fn is_auto_expand(&self) -> bool {
        self.auto_expand
    }

    /// The number of objects constructed per expansion, after treating `0` as `1`.
    #[must_use]
    pub fn expand_batch(&self) -> usize {
        self.expand_step.max(1)
    }

    /// The visibility used for the initial objects.
    #[must_use]
    pub fn visibility_value(&self) -> Visibility {
        self.visibility
    }
}
