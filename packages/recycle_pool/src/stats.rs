/// A point-in-time summary of the state of one pool.
///
/// `free + in_use` is always the number of live objects tracked by the pool.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct PoolStats {
    /// Objects waiting on the free list.
    pub free: usize,

    /// Objects currently leased to callers.
    pub in_use: usize,

    /// Objects constructed over the lifetime of the pool, including any that were discarded
    /// because a later construction in the same batch failed.
    pub constructed: u64,

    /// Successful acquisitions.
    pub acquisitions: u64,

    /// Successful releases.
    pub releases: u64,

    /// Acquisitions that had to construct new objects because the free list was empty.
    pub expansions: u64,
}

impl PoolStats {
    /// Total number of live objects tracked by the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free
            .checked_add(self.in_use)
            .expect("a pool cannot track more objects than fit in memory")
    }

    /// Whether the pool tracks no objects at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free == 0 && self.in_use == 0
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn len_adds_free_and_in_use() {
        let stats = PoolStats {
            free: 3,
            in_use: 2,
            ..PoolStats::default()
        };

        assert_eq!(stats.len(), 5);
        assert!(!stats.is_empty());
        assert!(PoolStats::default().is_empty());
    }
}
