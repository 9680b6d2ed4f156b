//! Directory Cache layer.
//!
//! The cache aggregates loaded partitions into two global indices and tracks
//! load and refresh state:
//!
//! - [`DirectoryCache`] owns the indices, the single-flight full load and the
//!   smart (partial) load.
//! - [`RefreshState`] decides when the cache is stale. Only full loads reset it.
//! - [`LookupResult`] and [`BatchOutcome`] carry "not found" and per-item
//!   failures as values.
//!
//! # Example
//!
//! ```ignore
//! let cache = DirectoryCache::new(store.clone(), store, CacheConfig::default());
//!
//! // Loads students_cse_1 on the first miss, then answers from memory.
//! let hit = cache.search_by_primary("22015112001").await;
//! assert!(hit.found);
//! ```

pub mod directory;
pub mod freshness;
pub mod lookup;
pub mod stats;

pub use directory::{CacheConfig, DirectoryCache, DEFAULT_REFRESH_INTERVAL};
pub use freshness::RefreshState;
pub use lookup::{
    BatchItemError, BatchOutcome, CachedBatch, FoundRecord, LoadSummary, LookupResult,
    SmartLoadReport,
};
pub use stats::CacheStats;
