//! Cache statistics and counters.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the directory cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Records indexed by primary key.
    pub total_records: usize,
    /// Records indexed by secondary key.
    pub total_by_secondary: usize,
    /// Partitions marked loaded.
    pub partitions_loaded: usize,
    pub last_full_refresh: Option<DateTime<Utc>>,
    pub needs_refresh: bool,
    /// A full load is in flight.
    pub is_loading: bool,
    pub cache_age_ms: Option<i64>,
    /// Lookups answered from the indices.
    pub hits: u64,
    /// Lookups that missed the indices at first check.
    pub misses: u64,
    /// Backing store reads issued for partition loads.
    pub partition_reads: u64,
    pub smart_loads: u64,
    pub full_loads: u64,
    /// Primary keys seen in more than one partition.
    pub duplicate_primary_keys: u64,
    /// Error of the last failed full refresh, cleared on success.
    pub last_refresh_error: Option<String>,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Monotonic counters shared by the cache's tasks.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub partition_reads: AtomicU64,
    pub smart_loads: AtomicU64,
    pub full_loads: AtomicU64,
    pub duplicate_primary_keys: AtomicU64,
}

impl CacheCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy counter values into `stats`.
    pub fn fill(&self, stats: &mut CacheStats) {
        stats.hits = self.hits.load(Ordering::Relaxed);
        stats.misses = self.misses.load(Ordering::Relaxed);
        stats.partition_reads = self.partition_reads.load(Ordering::Relaxed);
        stats.smart_loads = self.smart_loads.load(Ordering::Relaxed);
        stats.full_loads = self.full_loads.load(Ordering::Relaxed);
        stats.duplicate_primary_keys = self.duplicate_primary_keys.load(Ordering::Relaxed);
    }
}
