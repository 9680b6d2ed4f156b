//! Search Configuration Module
//!
//! Tunables for strategy selection, chunking, pacing and monitoring. Values
//! are loaded from environment variables with the defaults in
//! [`crate::constants`].

use std::time::Duration;

use roster_core::{ConfigError, RosterResult};
use roster_storage::CacheConfig;

use crate::constants::*;

// ============================================================================
// SEARCH CONFIGURATION
// ============================================================================

/// Configuration for the directory service and search orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    // ========================================================================
    // Freshness
    // ========================================================================
    /// How long a full refresh keeps the cache fresh.
    pub refresh_interval: Duration,

    // ========================================================================
    // Strategy
    // ========================================================================
    /// Batches at least this large use the cached path.
    pub cached_batch_threshold: usize,

    /// Batches at least this large use the cached path when the cache is warm.
    pub warm_batch_threshold: usize,

    /// The cache is warm when it holds more records than this.
    pub warm_cache_min_records: usize,

    // ========================================================================
    // Chunking
    // ========================================================================
    /// Ids per direct `in` query. Must be within the store's limit.
    pub query_chunk_size: usize,

    /// Ids per chunk in chunked batch searches.
    pub run_chunk_size: usize,

    /// Pause between chunks in chunked runs.
    pub chunk_delay: Duration,

    // ========================================================================
    // Lifecycle and monitoring
    // ========================================================================
    /// Run a full load during `init`.
    pub preload_on_init: bool,

    /// Samples kept by the performance monitor.
    pub monitor_history: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            cached_batch_threshold: DEFAULT_CACHED_BATCH_THRESHOLD,
            warm_batch_threshold: DEFAULT_WARM_BATCH_THRESHOLD,
            warm_cache_min_records: DEFAULT_WARM_CACHE_MIN_RECORDS,
            query_chunk_size: DEFAULT_QUERY_CHUNK_SIZE,
            run_chunk_size: DEFAULT_RUN_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            preload_on_init: false,
            monitor_history: DEFAULT_MONITOR_HISTORY,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl SearchConfig {
    /// Create SearchConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ROSTER_REFRESH_INTERVAL_SECS`: Full refresh validity (default: 300)
    /// - `ROSTER_QUERY_CHUNK_SIZE`: Ids per direct query, 1 to 10 (default: 10)
    /// - `ROSTER_CACHED_BATCH_THRESHOLD`: Batch size forcing the cache (default: 50)
    /// - `ROSTER_WARM_BATCH_THRESHOLD`: Batch size using a warm cache (default: 20)
    /// - `ROSTER_WARM_CACHE_MIN_RECORDS`: Records making the cache warm (default: 1000)
    /// - `ROSTER_RUN_CHUNK_SIZE`: Ids per chunk in chunked runs (default: 50)
    /// - `ROSTER_CHUNK_DELAY_MS`: Pause between chunks (default: 50)
    /// - `ROSTER_PRELOAD_ON_INIT`: "true" or "false" (default: false)
    /// - `ROSTER_MONITOR_HISTORY`: Samples kept by the monitor (default: 100)
    ///
    /// Unparseable values fall back to the default; call [`Self::validate`]
    /// to reject out of range ones.
    pub fn from_env() -> Self {
        let refresh_interval = env_parse::<u64>("ROSTER_REFRESH_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS));

        let chunk_delay = env_parse::<u64>("ROSTER_CHUNK_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CHUNK_DELAY);

        let preload_on_init = std::env::var("ROSTER_PRELOAD_ON_INIT")
            .ok()
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self {
            refresh_interval,
            cached_batch_threshold: env_parse("ROSTER_CACHED_BATCH_THRESHOLD")
                .unwrap_or(DEFAULT_CACHED_BATCH_THRESHOLD),
            warm_batch_threshold: env_parse("ROSTER_WARM_BATCH_THRESHOLD")
                .unwrap_or(DEFAULT_WARM_BATCH_THRESHOLD),
            warm_cache_min_records: env_parse("ROSTER_WARM_CACHE_MIN_RECORDS")
                .unwrap_or(DEFAULT_WARM_CACHE_MIN_RECORDS),
            query_chunk_size: env_parse("ROSTER_QUERY_CHUNK_SIZE")
                .unwrap_or(DEFAULT_QUERY_CHUNK_SIZE),
            run_chunk_size: env_parse("ROSTER_RUN_CHUNK_SIZE").unwrap_or(DEFAULT_RUN_CHUNK_SIZE),
            chunk_delay,
            preload_on_init,
            monitor_history: env_parse("ROSTER_MONITOR_HISTORY")
                .unwrap_or(DEFAULT_MONITOR_HISTORY),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> RosterResult<()> {
        if self.query_chunk_size == 0 || self.query_chunk_size > MAX_IN_QUERY_VALUES {
            return Err(invalid(
                "query_chunk_size",
                self.query_chunk_size,
                format!("must be between 1 and {}", MAX_IN_QUERY_VALUES),
            ));
        }
        if self.run_chunk_size == 0 {
            return Err(invalid("run_chunk_size", 0, "must be at least 1"));
        }
        if self.warm_batch_threshold > self.cached_batch_threshold {
            return Err(invalid(
                "warm_batch_threshold",
                self.warm_batch_threshold,
                format!(
                    "must not exceed cached_batch_threshold ({})",
                    self.cached_batch_threshold
                ),
            ));
        }
        if self.refresh_interval.is_zero() {
            return Err(invalid("refresh_interval", "0s", "must be positive"));
        }
        if self.monitor_history == 0 {
            return Err(invalid("monitor_history", 0, "must be at least 1"));
        }
        Ok(())
    }

    /// Directory cache settings derived from this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new().with_refresh_interval(self.refresh_interval)
    }
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> roster_core::RosterError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
    .into()
}
