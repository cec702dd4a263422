//! Metrics for the consistency layer.

use metrics::{Counter, Gauge, Histogram};
use metrics_derive::Metrics;

/// Metrics for the footprint manager.
#[derive(Metrics, Clone)]
#[metrics(scope = "consistency_footprint")]
pub struct FootprintMetrics {
    /// Count of footprint comparisons written to the cache.
    #[metric(describe = "Count of footprint comparisons written to the cache")]
    pub stored: Counter,

    /// Count of comparisons dropped because a footprint failed validation.
    #[metric(describe = "Count of comparisons dropped because a footprint failed validation")]
    pub rejected: Counter,

    /// Count of cache entries evicted for being too old.
    #[metric(describe = "Count of cache entries evicted for being too old")]
    pub evicted: Counter,

    /// Count of mismatches newly recorded in the ledger.
    #[metric(describe = "Count of mismatches newly recorded in the ledger")]
    pub mismatches_recorded: Counter,

    /// Count of mismatches that were already known.
    #[metric(describe = "Count of mismatches that were already known")]
    pub mismatches_known: Counter,

    /// Count of failed ledger writes.
    #[metric(describe = "Count of failed ledger writes")]
    pub ledger_write_errors: Counter,

    /// Number of entries currently cached.
    #[metric(describe = "Number of entries currently cached")]
    pub cache_size: Gauge,

    /// Number of known mismatches held in memory.
    #[metric(describe = "Number of known mismatches held in memory")]
    pub known_mismatches: Gauge,
}

/// Metrics for the source metadata store and context resolver.
#[derive(Metrics, Clone)]
#[metrics(scope = "consistency_source_meta")]
pub struct SourceMetaMetrics {
    /// Count of metadata lookups served from the LRU cache.
    #[metric(describe = "Count of metadata lookups served from the LRU cache")]
    pub cache_hits: Counter,

    /// Count of metadata lookups that fell through to the durable store.
    #[metric(describe = "Count of metadata lookups that fell through to the durable store")]
    pub cache_misses: Counter,

    /// Count of durable reads or writes that failed.
    #[metric(describe = "Count of durable reads or writes that failed")]
    pub store_errors: Counter,

    /// Count of durable records that decoded as corrupt.
    #[metric(describe = "Count of durable records that decoded as corrupt")]
    pub corrupt_records: Counter,

    /// Number of ancestor headers visited per resolver query.
    #[metric(describe = "Number of ancestor headers visited per resolver query")]
    pub resolver_walk_depth: Histogram,
}
