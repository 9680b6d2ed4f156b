//! Backing store and partition registry traits.
//!
//! The document store is the source of truth; the directory cache is a
//! process-local layer over it. Both traits are async and object safe so the
//! cache can hold `Arc<dyn ...>` clients injected at construction.

use async_trait::async_trait;
use roster_core::{Document, FilterExpr, StoreResult};
use serde::{Deserialize, Serialize};

/// Read access to the partitioned document store.
///
/// Reads are assumed eventually consistent. No ordering is guaranteed for
/// returned documents and no transaction spans partitions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read every document in `partition` matching all of `filters`.
    ///
    /// A partition that does not exist yields an empty result, not an error.
    /// `in` filters longer than [`roster_core::MAX_IN_VALUES`] are rejected
    /// with [`roster_core::StoreError::InvalidQuery`]. Filters on
    /// [`roster_core::fields::PRIMARY_KEY`] match the decoded primary key.
    async fn query(&self, partition: &str, filters: &[FilterExpr]) -> StoreResult<Vec<Document>>;
}

/// Bookkeeping about which partitions exist and hold data.
#[async_trait]
pub trait PartitionRegistry: Send + Sync {
    /// All known partitions, in registry order.
    async fn list_partitions(&self) -> StoreResult<Vec<PartitionInfo>>;
}

/// Registry descriptor for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub name: String,
    pub display_name: String,
    /// Documents in the partition.
    pub record_count: u64,
    /// Documents flagged active.
    pub active_count: u64,
    /// Archived partitions are inactive.
    pub active: bool,
    pub department_code: Option<String>,
}

impl PartitionInfo {
    /// Whether a full load should read this partition.
    pub fn holds_data(&self) -> bool {
        self.active && self.record_count > 0
    }
}

/// Names of the partitions a full load reads, in registry order.
pub fn loadable_partitions(partitions: &[PartitionInfo]) -> Vec<String> {
    partitions
        .iter()
        .filter(|p| p.holds_data())
        .map(|p| p.name.clone())
        .collect()
}
