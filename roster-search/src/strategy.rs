//! Strategy selection for batch lookups.
//!
//! The choice between the cached and the direct path is a fixed decision
//! table over the batch size and a snapshot of the cache. The same inputs
//! always produce the same decision; the reason string is for logs and
//! reports only.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;

/// How a batch is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    /// Smart load the target partitions, then answer from the cache.
    Cached,
    /// Query target partitions directly in chunks.
    Direct,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Direct => "direct",
        }
    }

    /// The other path, used as the fallback.
    pub fn other(&self) -> Self {
        match self {
            Self::Cached => Self::Direct,
            Self::Direct => Self::Cached,
        }
    }
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call search options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Force a path instead of consulting the decision table.
    pub method: Option<SearchMethod>,
}

impl SearchOptions {
    pub fn forced(method: SearchMethod) -> Self {
        Self {
            method: Some(method),
        }
    }
}

/// Cache figures the decision table looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub total_records: usize,
    pub needs_refresh: bool,
}

/// A strategy decision and why it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub method: SearchMethod,
    pub reason: String,
}

impl StrategyDecision {
    fn new(method: SearchMethod, reason: impl Into<String>) -> Self {
        Self {
            method,
            reason: reason.into(),
        }
    }
}

/// Pick the path for a batch of `batch_size` ids.
///
/// Rules, first match wins:
/// 1. caller override
/// 2. `batch_size >= cached_batch_threshold` -> cached
/// 3. `warm_batch_threshold <= batch_size` and the cache holds more than
///    `warm_cache_min_records` -> cached
/// 4. cache needs a refresh -> direct
/// 5. otherwise -> direct
pub fn choose_strategy(
    batch_size: usize,
    cache: CacheSnapshot,
    options: &SearchOptions,
    config: &SearchConfig,
) -> StrategyDecision {
    if let Some(method) = options.method {
        return StrategyDecision::new(method, "caller override");
    }
    if batch_size >= config.cached_batch_threshold {
        return StrategyDecision::new(
            SearchMethod::Cached,
            format!(
                "large batch ({} >= {}), cache amortizes better",
                batch_size, config.cached_batch_threshold
            ),
        );
    }
    if batch_size >= config.warm_batch_threshold
        && cache.total_records > config.warm_cache_min_records
    {
        return StrategyDecision::new(
            SearchMethod::Cached,
            format!(
                "medium batch ({}) with warm cache ({} records)",
                batch_size, cache.total_records
            ),
        );
    }
    if cache.needs_refresh {
        return StrategyDecision::new(
            SearchMethod::Direct,
            "cache stale or empty, avoid paying for a reload",
        );
    }
    StrategyDecision::new(SearchMethod::Direct, format!("small batch ({})", batch_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cold() -> CacheSnapshot {
        CacheSnapshot {
            total_records: 0,
            needs_refresh: true,
        }
    }

    fn warm(records: usize) -> CacheSnapshot {
        CacheSnapshot {
            total_records: records,
            needs_refresh: false,
        }
    }

    fn decide(size: usize, cache: CacheSnapshot) -> StrategyDecision {
        choose_strategy(size, cache, &SearchOptions::default(), &SearchConfig::default())
    }

    #[test]
    fn test_large_batch_uses_cache_even_when_cold() {
        let decision = decide(60, cold());
        assert_eq!(decision.method, SearchMethod::Cached);
        assert!(decision.reason.contains("large batch"));
        assert_eq!(decide(50, cold()).method, SearchMethod::Cached);
    }

    #[test]
    fn test_small_batch_on_cold_cache_goes_direct() {
        let decision = decide(5, cold());
        assert_eq!(decision.method, SearchMethod::Direct);
        assert!(decision.reason.contains("stale"));
    }

    #[test]
    fn test_medium_batch_needs_strictly_more_than_min_records() {
        assert_eq!(decide(20, warm(1001)).method, SearchMethod::Cached);
        assert_eq!(decide(49, warm(5000)).method, SearchMethod::Cached);
        assert_eq!(decide(20, warm(1000)).method, SearchMethod::Direct);
        assert_eq!(decide(19, warm(5000)).method, SearchMethod::Direct);
    }

    #[test]
    fn test_warm_rule_applies_before_staleness() {
        let stale_but_big = CacheSnapshot {
            total_records: 2000,
            needs_refresh: true,
        };
        assert_eq!(decide(25, stale_but_big).method, SearchMethod::Cached);
    }

    #[test]
    fn test_small_batch_on_fresh_cache() {
        let decision = decide(3, warm(10));
        assert_eq!(decision.method, SearchMethod::Direct);
        assert!(decision.reason.contains("small batch"));
    }

    #[test]
    fn test_override_wins() {
        let decision = choose_strategy(
            500,
            cold(),
            &SearchOptions::forced(SearchMethod::Direct),
            &SearchConfig::default(),
        );
        assert_eq!(decision.method, SearchMethod::Direct);
        assert_eq!(decision.reason, "caller override");
    }

    #[test]
    fn test_other() {
        assert_eq!(SearchMethod::Cached.other(), SearchMethod::Direct);
        assert_eq!(SearchMethod::Direct.other(), SearchMethod::Cached);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The decision table is a pure function of its inputs.
        #[test]
        fn prop_decision_is_reproducible(
            size in 0usize..200,
            records in 0usize..5000,
            stale in any::<bool>(),
        ) {
            let cache = CacheSnapshot { total_records: records, needs_refresh: stale };
            let config = SearchConfig::default();
            let a = choose_strategy(size, cache, &SearchOptions::default(), &config);
            let b = choose_strategy(size, cache, &SearchOptions::default(), &config);
            prop_assert_eq!(a, b);
        }

        /// Batches at or over the threshold always use the cache.
        #[test]
        fn prop_large_batches_cached(size in 50usize..10_000, stale in any::<bool>()) {
            let cache = CacheSnapshot { total_records: 0, needs_refresh: stale };
            let decision = choose_strategy(size, cache, &SearchOptions::default(), &SearchConfig::default());
            prop_assert_eq!(decision.method, SearchMethod::Cached);
        }
    }
}
