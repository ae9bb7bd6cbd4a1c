//! Configuration and statistics for a single collector instance.

/// Configuration for a `GarbageCollector`. Every thread's collector and the
/// static collector each carry their own `Configuration`; there is no
/// process-wide configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Number of allocations a collector accumulates before an automatic,
    /// non-forced `collect` actually runs. There is no documented "right"
    /// value for this threshold; it is a heuristic an embedder can tune for
    /// their allocation pattern.
    pub allocation_threshold: usize,
    /// Capacity hint for the root-stack and heap-set maps, to avoid rehashing
    /// during the first few allocations of a short-lived collector.
    pub initial_capacity: usize,
}

impl Default for Configuration {
    /// `allocation_threshold` defaults to 10,000 allocations; `initial_capacity`
    /// to 64 entries.
    fn default() -> Self {
        Self {
            allocation_threshold: 10_000,
            initial_capacity: 64,
        }
    }
}

/// Cumulative statistics for a collector, readable via
/// [`GarbageCollector::statistics`](crate::GarbageCollector::statistics).
#[derive(Clone, Debug, Default)]
pub struct Statistics {
    /// Number of `collect` calls that actually ran a mark/sweep cycle
    /// (i.e. excludes calls suppressed by the threshold check).
    pub collections_performed: usize,
    /// Total objects marked reachable, summed across all collections.
    pub objects_marked: usize,
    /// Total objects swept (destroyed), summed across all collections.
    pub objects_swept: usize,
    /// Total bytes reclaimed, summed across all collections.
    pub bytes_freed: usize,
    /// Wall-clock time of the most recent collection, if one has run.
    pub last_collection_duration: Option<std::time::Duration>,
}
