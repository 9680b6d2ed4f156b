//! Roster Storage - Backing Store Traits, Loader and Directory Cache
//!
//! Defines the boundary to the partitioned document store and the partition
//! registry, an in-memory implementation of both, the Partition Loader and
//! the Directory Cache built on top of them.

pub mod cache;
pub mod loader;
pub mod memory;
pub mod store;

pub use cache::{
    BatchItemError, BatchOutcome, CacheConfig, CacheStats, CachedBatch, DirectoryCache,
    FoundRecord, LoadSummary, LookupResult, RefreshState, SmartLoadReport,
    DEFAULT_REFRESH_INTERVAL,
};
pub use loader::PartitionLoader;
pub use memory::{InMemoryStore, SnapshotPartition, StoreSnapshot};
pub use store::{loadable_partitions, DocumentStore, PartitionInfo, PartitionRegistry};
