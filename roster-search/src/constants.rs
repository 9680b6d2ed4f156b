//! Constants for roster search
//!
//! Default values for every tunable in [`crate::config::SearchConfig`], plus
//! the hard limits of the backing store.

use std::time::Duration;

// ============================================================================
// BACKING STORE LIMITS
// ============================================================================

/// Most values a single `in` query may carry.
pub const MAX_IN_QUERY_VALUES: usize = roster_core::MAX_IN_VALUES;

// ============================================================================
// FRESHNESS
// ============================================================================

/// Default validity of a full refresh in seconds (5 minutes)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

// ============================================================================
// STRATEGY THRESHOLDS
// ============================================================================

/// Batches at least this large always use the cache.
pub const DEFAULT_CACHED_BATCH_THRESHOLD: usize = 50;

/// Batches at least this large use the cache when it is already warm.
pub const DEFAULT_WARM_BATCH_THRESHOLD: usize = 20;

/// Records the cache must hold (strictly more than) to count as warm.
pub const DEFAULT_WARM_CACHE_MIN_RECORDS: usize = 1000;

// ============================================================================
// CHUNKING AND PACING
// ============================================================================

/// Ids per direct query chunk
pub const DEFAULT_QUERY_CHUNK_SIZE: usize = 10;

/// Ids per chunk in chunked runs
pub const DEFAULT_RUN_CHUNK_SIZE: usize = 50;

/// Pause between chunks in milliseconds
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 50;

/// Pause between chunks
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(DEFAULT_CHUNK_DELAY_MS);

// ============================================================================
// MONITORING
// ============================================================================

/// Samples kept by the performance monitor
pub const DEFAULT_MONITOR_HISTORY: usize = 100;

/// Operation latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
pub const OPERATION_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Component name used in health checks and logs
pub const COMPONENT_NAME: &str = "directory";
