//! In-memory document store and partition registry.
//!
//! Used by tests and by the `roster-lookup` tool, which loads a JSON snapshot
//! of partitions into it. Partitions keep insertion order, which is also the
//! registry order.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use roster_core::{fields, Document, FilterExpr, KeyRouter, StoreResult};
use serde::Deserialize;

use crate::store::{DocumentStore, PartitionInfo, PartitionRegistry};

#[derive(Debug, Clone)]
struct StoredPartition {
    name: String,
    display_name: String,
    active: bool,
    department_code: Option<String>,
    documents: Vec<Document>,
}

impl StoredPartition {
    fn new(name: &str) -> Self {
        let department = KeyRouter::standard().department_for_partition(name);
        Self {
            name: name.to_string(),
            display_name: department
                .as_ref()
                .map(|d| format!("{} - Section {}", d.department_code, d.section_index))
                .unwrap_or_else(|| name.to_string()),
            active: true,
            department_code: department.map(|d| d.department_code),
            documents: Vec::new(),
        }
    }

    fn info(&self) -> PartitionInfo {
        let active_count = self
            .documents
            .iter()
            .filter(|d| d.get_bool(fields::ACTIVE).unwrap_or(true))
            .count();
        PartitionInfo {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            record_count: self.documents.len() as u64,
            active_count: active_count as u64,
            active: self.active,
            department_code: self.department_code.clone(),
        }
    }
}

/// Serialized form of an in-memory store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSnapshot {
    pub partitions: Vec<SnapshotPartition>,
}

/// One partition of a [`StoreSnapshot`].
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotPartition {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub department_code: Option<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

fn default_active() -> bool {
    true
}

/// In-memory store implementing both [`DocumentStore`] and [`PartitionRegistry`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    partitions: RwLock<Vec<StoredPartition>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        {
            let mut partitions = store.write();
            for p in snapshot.partitions {
                let mut stored = StoredPartition::new(&p.name);
                if let Some(display_name) = p.display_name {
                    stored.display_name = display_name;
                }
                if p.department_code.is_some() {
                    stored.department_code = p.department_code;
                }
                stored.active = p.active;
                stored.documents = p.documents;
                partitions.push(stored);
            }
        }
        store
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<StoredPartition>> {
        self.partitions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<StoredPartition>> {
        self.partitions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an empty partition if it does not exist yet.
    pub fn create_partition(&self, name: &str) {
        let mut partitions = self.write();
        if !partitions.iter().any(|p| p.name == name) {
            partitions.push(StoredPartition::new(name));
        }
    }

    /// Add a document to `partition`, creating the partition on first use.
    pub fn insert_document(&self, partition: &str, doc: Document) {
        let mut partitions = self.write();
        match partitions.iter_mut().find(|p| p.name == partition) {
            Some(existing) => existing.documents.push(doc),
            None => {
                let mut stored = StoredPartition::new(partition);
                stored.documents.push(doc);
                partitions.push(stored);
            }
        }
    }

    /// Add many documents to one partition.
    pub fn insert_documents(&self, partition: &str, docs: impl IntoIterator<Item = Document>) {
        for doc in docs {
            self.insert_document(partition, doc);
        }
    }

    /// Archive or reactivate a partition.
    pub fn set_partition_active(&self, partition: &str, active: bool) {
        if let Some(p) = self.write().iter_mut().find(|p| p.name == partition) {
            p.active = active;
        }
    }

    /// Total documents across all partitions.
    pub fn document_count(&self) -> usize {
        self.read().iter().map(|p| p.documents.len()).sum()
    }

    /// Partition names in registry order.
    pub fn partition_names(&self) -> Vec<String> {
        self.read().iter().map(|p| p.name.clone()).collect()
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.write().clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn query(&self, partition: &str, filters: &[FilterExpr]) -> StoreResult<Vec<Document>> {
        for filter in filters {
            filter.validate()?;
        }
        let partitions = self.read();
        let Some(stored) = partitions.iter().find(|p| p.name == partition) else {
            return Ok(Vec::new());
        };
        Ok(stored
            .documents
            .iter()
            .filter(|doc| filters.iter().all(|f| f.matches(doc)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PartitionRegistry for InMemoryStore {
    async fn list_partitions(&self) -> StoreResult<Vec<PartitionInfo>> {
        Ok(self.read().iter().map(StoredPartition::info).collect())
    }
}
