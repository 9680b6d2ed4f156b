//! Partition Loader: reads one partition from the backing store and turns its
//! documents into [`Record`]s.
//!
//! The loader is stateless. Load-once bookkeeping belongs to the directory
//! cache, which owns the indices the records end up in.

use std::sync::Arc;

use roster_core::{fields, FilterExpr, KeyRouter, Record, StoreResult};
use tracing::debug;

use crate::store::DocumentStore;

/// Reads partitions and builds records at the load boundary.
#[derive(Clone)]
pub struct PartitionLoader {
    store: Arc<dyn DocumentStore>,
    router: KeyRouter,
}

impl PartitionLoader {
    /// Create a loader over `store` using the standard section table.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_router(store, KeyRouter::standard().clone())
    }

    /// Create a loader with a custom router.
    pub fn with_router(store: Arc<dyn DocumentStore>, router: KeyRouter) -> Self {
        Self { store, router }
    }

    /// The router used for department fallbacks.
    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Read every active record in `partition`.
    pub async fn fetch(&self, partition: &str) -> StoreResult<Vec<Record>> {
        let docs = self
            .store
            .query(partition, &[FilterExpr::eq(fields::ACTIVE, true)])
            .await?;
        let records: Vec<Record> = docs
            .iter()
            .map(|doc| Record::from_document(partition, doc, &self.router))
            .collect();
        debug!(partition = %partition, records = records.len(), "Fetched partition");
        Ok(records)
    }

    /// Read the active records of `partition` whose primary key is in `ids`.
    ///
    /// `ids` must fit in a single `in` filter; callers chunk larger sets.
    pub async fn fetch_by_primary<S: AsRef<str>>(
        &self,
        partition: &str,
        ids: &[S],
    ) -> StoreResult<Vec<Record>> {
        let filters = [
            FilterExpr::primary_key_in(ids),
            FilterExpr::eq(fields::ACTIVE, true),
        ];
        let docs = self.store.query(partition, &filters).await?;
        Ok(docs
            .iter()
            .map(|doc| Record::from_document(partition, doc, &self.router))
            .collect())
    }
}

impl std::fmt::Debug for PartitionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use roster_core::Document;

    fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store.insert_documents(
            "students_cse_1",
            vec![
                Document::new("a")
                    .with_field(fields::ADMISSION_NUMBER, "22015112001")
                    .with_field(fields::ACTIVE, true),
                Document::new("b")
                    .with_field(fields::ADMISSION_NUMBER, "22015112002")
                    .with_field(fields::ACTIVE, false),
                Document::new("c")
                    .with_field(fields::ADMISSION_NUMBER, "22015112003")
                    .with_field(fields::ACTIVE, true),
            ],
        );
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_fetch_only_active() {
        let loader = PartitionLoader::new(store());
        let records = loader.fetch("students_cse_1").await.unwrap();
        let mut keys: Vec<&str> = records.iter().map(|r| r.primary_key.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["22015112001", "22015112003"]);
        assert!(records.iter().all(|r| r.department_code == "CSE"));
    }

    #[tokio::test]
    async fn test_fetch_by_primary() {
        let loader = PartitionLoader::new(store());
        let records = loader
            .fetch_by_primary("students_cse_1", &["22015112002", "22015112003", "nope"])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].primary_key, "22015112003");
    }
}
