//! Roster Test Utilities
//!
//! Shared test infrastructure for the roster workspace:
//! - An instrumented store double (call counters, failure injection, latency)
//! - Proptest generators for admission numbers and batches
//! - Fixtures for seeded stores and documents
//! - Custom assertions for batch results

pub use roster_storage::InMemoryStore;

pub use roster_core::{
    fields, Document, FilterExpr, KeyRouter, Record, RosterError, RosterResult, StoreError,
    StoreResult, SECTION_TABLE,
};
pub use roster_storage::{BatchOutcome, DocumentStore, PartitionInfo, PartitionRegistry};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

// ============================================================================
// INSTRUMENTED STORE
// ============================================================================

/// In-memory store that counts calls and can be told to fail or stall.
///
/// Every `query` is recorded with its partition so tests can assert exactly
/// which partitions were read and in what order.
#[derive(Debug, Default)]
pub struct InstrumentedStore {
    inner: InMemoryStore,
    queries: AtomicUsize,
    registry_calls: AtomicUsize,
    query_log: Mutex<Vec<String>>,
    failing_partitions: Mutex<HashSet<String>>,
    registry_down: AtomicBool,
    latency: Option<Duration>,
}

impl InstrumentedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The wrapped store, for seeding.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Make queries on `partition` fail.
    pub fn fail_partition(&self, partition: &str) {
        self.failing_partitions
            .lock()
            .unwrap()
            .insert(partition.to_string());
    }

    /// Let queries on `partition` succeed again.
    pub fn heal_partition(&self, partition: &str) {
        self.failing_partitions.lock().unwrap().remove(partition);
    }

    /// Make the registry unreachable (or reachable again).
    pub fn set_registry_down(&self, down: bool) {
        self.registry_down.store(down, Ordering::SeqCst);
    }

    /// Total document queries issued.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Document queries issued against `partition`.
    pub fn queries_for(&self, partition: &str) -> usize {
        self.query_log
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == partition)
            .count()
    }

    /// Partitions queried, in call order.
    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().unwrap().clone()
    }

    /// Registry reads issued.
    pub fn registry_count(&self) -> usize {
        self.registry_calls.load(Ordering::SeqCst)
    }

    /// Forget recorded calls.
    pub fn reset_counts(&self) {
        self.queries.store(0, Ordering::SeqCst);
        self.registry_calls.store(0, Ordering::SeqCst);
        self.query_log.lock().unwrap().clear();
    }

    async fn stall(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DocumentStore for InstrumentedStore {
    async fn query(&self, partition: &str, filters: &[FilterExpr]) -> StoreResult<Vec<Document>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.query_log.lock().unwrap().push(partition.to_string());
        self.stall().await;
        if self.failing_partitions.lock().unwrap().contains(partition) {
            return Err(StoreError::QueryFailed {
                partition: partition.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        self.inner.query(partition, filters).await
    }
}

#[async_trait]
impl PartitionRegistry for InstrumentedStore {
    async fn list_partitions(&self) -> StoreResult<Vec<PartitionInfo>> {
        self.registry_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.registry_down.load(Ordering::SeqCst) {
            return Err(StoreError::RegistryUnavailable {
                reason: "injected failure".to_string(),
            });
        }
        self.inner.list_partitions().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for identifiers and batches.

    use super::*;
    use proptest::prelude::*;

    /// Generate an admission number that routes to a table partition.
    pub fn arb_routable_id() -> impl Strategy<Value = String> {
        (
            "[0-9]{2}",
            "[0-9]",
            "[0-9]",
            0usize..SECTION_TABLE.len(),
            "[1-8][0-9]{3,5}",
        )
            .prop_map(|(year, batch, campus, idx, serial)| {
                format!("{year}{batch}{campus}{}{serial}", SECTION_TABLE[idx].code)
            })
    }

    /// Generate an identifier that never routes.
    pub fn arb_unroutable_id() -> impl Strategy<Value = String> {
        prop_oneof![
            "[0-9]{0,7}",
            "[A-Za-z][A-Za-z0-9]{7,12}",
            "[0-9]{4}8[0-9]8[0-9]{3}",
        ]
    }

    /// Generate a mixed batch, possibly with duplicates.
    pub fn arb_id_batch(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop_oneof![3 => arb_routable_id(), 1 => arb_unroutable_id()],
            0..=max,
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built documents and stores for common scenarios.

    use super::*;

    /// Admission number in batch 0, campus 1 of `year`.
    pub fn admission_number(year: u8, section_code: &str, serial: u32) -> String {
        format!("{year:02}01{section_code}{serial:05}")
    }

    /// An active student document.
    pub fn student_doc(admission: &str, roll: &str, name: &str) -> Document {
        Document::new(format!("doc-{admission}"))
            .with_field(fields::ADMISSION_NUMBER, admission)
            .with_field(fields::ROLL_NUMBER, roll)
            .with_field(fields::NAME, name)
            .with_field(fields::ACTIVE, true)
    }

    /// Add `count` active students to the partition owning `section_code`.
    ///
    /// Returns the admission numbers inserted.
    pub fn seed_section(store: &InMemoryStore, section_code: &str, count: u32) -> Vec<String> {
        let Some(info) = KeyRouter::standard().department_info(section_code) else {
            return Vec::new();
        };
        (1..=count)
            .map(|serial| {
                let admission = admission_number(22, section_code, 12000 + serial);
                let roll = format!("{}{:03}-{}", info.department_code, serial, section_code);
                store.insert_document(
                    &info.partition,
                    student_doc(&admission, &roll, &format!("Student {section_code}-{serial}")),
                );
                admission
            })
            .collect()
    }

    /// Store with three CSE-1 students, two IT-1 students, one inactive
    /// CSE-1 student and a legacy partition holding an unroutable id.
    pub fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        seed_section(&store, "51", 3);
        seed_section(&store, "61", 2);
        store.insert_document(
            "students_cse_1",
            student_doc("22015112999", "CSE999", "Dropped Student").with_field(fields::ACTIVE, false),
        );
        store.insert_document("students_legacy_1", student_doc("LEGACY0001", "LEG001", "Legacy Student"));
        store
    }

    /// `seeded_store` wrapped in an instrumented double.
    pub fn instrumented_store() -> InstrumentedStore {
        InstrumentedStore::new(seeded_store())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for roster results.

    use super::*;

    /// Assert that a RosterResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &RosterResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a RosterResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &RosterResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that every input id lands in exactly one list, once per occurrence.
    #[track_caller]
    pub fn assert_accounts_for<S: AsRef<str>>(outcome: &BatchOutcome, input: &[S]) {
        assert_eq!(
            outcome.total(),
            input.len(),
            "Batch accounts for {} ids, input had {}: {:?}",
            outcome.total(),
            input.len(),
            outcome
        );

        let mut expected: Vec<&str> = input.iter().map(|s| s.as_ref()).collect();
        let mut actual: Vec<&str> = outcome
            .found
            .iter()
            .map(|f| f.id.as_str())
            .chain(outcome.not_found.iter().map(String::as_str))
            .chain(outcome.errors.iter().map(|e| e.id.as_str()))
            .collect();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected, "Batch ids differ from input");
    }

    /// Assert that `id` was found and came from `partition`.
    #[track_caller]
    pub fn assert_found_in(outcome: &BatchOutcome, id: &str, partition: &str) {
        match outcome.found.iter().find(|f| f.id == id) {
            Some(found) => assert_eq!(
                found.record.partition_name, partition,
                "{id} found in the wrong partition"
            ),
            None => panic!("Expected {id} to be found, got: {:?}", outcome),
        }
    }
}
