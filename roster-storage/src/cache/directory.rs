//! Directory Cache: process-local indices over the partitioned store.
//!
//! The cache holds two indices (primary key and secondary key) built from
//! whole partitions. Partitions are loaded on demand ("smart load") or all at
//! once ("full load"); only a full load makes the cache fresh.
//!
//! # Concurrency
//!
//! Index state lives behind one `RwLock`, and every mutation happens inside a
//! single write section, so readers never see a half-indexed partition. The
//! full load is single-flight: the first caller installs a shared future in
//! the in-flight slot and every concurrent caller awaits that same future.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use roster_core::{normalize_identifier, KeyRouter, Record, RosterError, RosterResult, StoreResult};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::freshness::RefreshState;
use super::lookup::{BatchItemError, BatchOutcome, CachedBatch, LoadSummary, LookupResult, SmartLoadReport};
use super::stats::{CacheCounters, CacheStats};
use crate::loader::PartitionLoader;
use crate::store::{loadable_partitions, DocumentStore, PartitionRegistry};

/// Default validity window of a full refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configuration for the directory cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a full refresh keeps the cache fresh.
    pub refresh_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

type SharedLoad = Shared<BoxFuture<'static, RosterResult<LoadSummary>>>;

struct InFlight {
    id: u64,
    future: SharedLoad,
}

struct CacheState {
    primary: HashMap<String, Arc<Record>>,
    secondary: HashMap<String, Arc<Record>>,
    /// Loaded partitions and the records each contributed.
    partitions: HashMap<String, Vec<Arc<Record>>>,
    refresh: RefreshState,
    last_refresh_error: Option<String>,
}

impl CacheState {
    fn new(refresh_interval: Duration) -> Self {
        Self {
            primary: HashMap::new(),
            secondary: HashMap::new(),
            partitions: HashMap::new(),
            refresh: RefreshState::new(refresh_interval),
            last_refresh_error: None,
        }
    }

    fn clear_indices(&mut self) {
        self.primary.clear();
        self.secondary.clear();
        self.partitions.clear();
    }

    fn summary(&self) -> LoadSummary {
        LoadSummary {
            total_records: self.primary.len(),
            partitions_loaded: self.partitions.len(),
            failed_partitions: Vec::new(),
        }
    }
}

struct DirectoryInner {
    loader: PartitionLoader,
    registry: Arc<dyn PartitionRegistry>,
    state: RwLock<CacheState>,
    in_flight: Mutex<Option<InFlight>>,
    loading: AtomicBool,
    next_load_id: AtomicU64,
    counters: CacheCounters,
}

/// Directory cache handle. Clones share the same cache.
#[derive(Clone)]
pub struct DirectoryCache {
    inner: Arc<DirectoryInner>,
}

impl DirectoryCache {
    /// Create an empty cache over the given store and registry.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<dyn PartitionRegistry>,
        config: CacheConfig,
    ) -> Self {
        Self::with_loader(PartitionLoader::new(store), registry, config)
    }

    /// Create an empty cache around an existing loader.
    pub fn with_loader(
        loader: PartitionLoader,
        registry: Arc<dyn PartitionRegistry>,
        config: CacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                loader,
                registry,
                state: RwLock::new(CacheState::new(config.refresh_interval)),
                in_flight: Mutex::new(None),
                loading: AtomicBool::new(false),
                next_load_id: AtomicU64::new(1),
                counters: CacheCounters::default(),
            }),
        }
    }

    pub fn loader(&self) -> &PartitionLoader {
        &self.inner.loader
    }

    pub fn registry(&self) -> &Arc<dyn PartitionRegistry> {
        &self.inner.registry
    }

    pub fn router(&self) -> &KeyRouter {
        self.inner.loader.router()
    }

    // ========================================================================
    // Partition loads
    // ========================================================================

    /// Load one partition, reporting failure.
    ///
    /// A loaded partition is returned from memory without a store read. A
    /// failed read leaves the partition unloaded so a later call retries it.
    pub async fn try_load_partition(&self, partition: &str) -> RosterResult<Vec<Arc<Record>>> {
        self.read_partition(partition)
            .await
            .map_err(|e| RosterError::partition_load(partition, e))
    }

    async fn read_partition(&self, partition: &str) -> StoreResult<Vec<Arc<Record>>> {
        if let Some(records) = self.inner.state.read().await.partitions.get(partition) {
            return Ok(records.clone());
        }

        CacheCounters::bump(&self.inner.counters.partition_reads);
        let fetched = self.inner.loader.fetch(partition).await?;

        let mut state = self.inner.state.write().await;
        // Another task finished the same partition while we were reading.
        if let Some(existing) = state.partitions.get(partition) {
            return Ok(existing.clone());
        }
        let records: Vec<Arc<Record>> = fetched.into_iter().map(Arc::new).collect();
        self.index_partition(&mut state, partition, &records);
        debug!(partition = %partition, records = records.len(), "Partition loaded");
        Ok(records)
    }

    /// Load one partition. Failures are logged and yield an empty set.
    pub async fn load_partition(&self, partition: &str) -> Vec<Arc<Record>> {
        match self.try_load_partition(partition).await {
            Ok(records) => records,
            Err(err) => {
                warn!(partition = %partition, error = %err, "Partition load failed");
                Vec::new()
            }
        }
    }

    fn index_partition(&self, state: &mut CacheState, partition: &str, records: &[Arc<Record>]) {
        for record in records {
            if let Some(previous) = state.primary.get(&record.primary_key) {
                if previous.partition_name != partition {
                    CacheCounters::bump(&self.inner.counters.duplicate_primary_keys);
                    warn!(
                        primary_key = %record.primary_key,
                        previous = %previous.partition_name,
                        current = %partition,
                        "Primary key present in more than one partition, keeping last loaded"
                    );
                }
            }
            state
                .primary
                .insert(record.primary_key.clone(), Arc::clone(record));
            if let Some(secondary) = record.secondary_key.as_deref().filter(|k| !k.is_empty()) {
                state
                    .secondary
                    .insert(secondary.to_string(), Arc::clone(record));
            }
        }
        state
            .partitions
            .insert(partition.to_string(), records.to_vec());
    }

    /// Load the partitions that `ids` route to and that are not yet loaded.
    ///
    /// Ids that do not route are listed in the report and left for the
    /// fallback scan.
    pub async fn smart_load<S: AsRef<str>>(&self, ids: &[S]) -> SmartLoadReport {
        CacheCounters::bump(&self.inner.counters.smart_loads);
        let router = self.router();
        let mut report = SmartLoadReport::default();

        for id in ids {
            match router.target_partition(id.as_ref()) {
                Some(partition) => {
                    if !report.requested_partitions.iter().any(|p| p == partition) {
                        report.requested_partitions.push(partition.to_string());
                    }
                }
                None => report.unroutable.push(id.as_ref().to_string()),
            }
        }

        let to_load: Vec<String> = {
            let state = self.inner.state.read().await;
            let (loaded, missing): (Vec<String>, Vec<String>) = report
                .requested_partitions
                .iter()
                .cloned()
                .partition(|p| state.partitions.contains_key(p));
            report.already_loaded = loaded;
            missing
        };

        let results = join_all(to_load.iter().map(|p| self.read_partition(p))).await;
        for (partition, result) in to_load.into_iter().zip(results) {
            match result {
                Ok(_) => report.loaded.push(partition),
                Err(err) => {
                    warn!(partition = %partition, error = %err, "Smart load skipped partition");
                    report.failed.push((partition, err.to_string()));
                }
            }
        }

        debug!(
            requested = report.requested_partitions.len(),
            loaded = report.loaded.len(),
            already_loaded = report.already_loaded.len(),
            failed = report.failed.len(),
            unroutable = report.unroutable.len(),
            "Smart load finished"
        );
        report
    }

    // ========================================================================
    // Full loads
    // ========================================================================

    /// Load every partition the registry reports as holding data.
    ///
    /// Concurrent calls share one in-flight load. Without `force`, a fresh
    /// non-empty cache is returned as is. If the registry cannot be read the
    /// current indices are kept and the error is returned.
    pub async fn load_all(&self, force: bool) -> RosterResult<LoadSummary> {
        let (id, future) = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(flight) => {
                    debug!(load_id = flight.id, "Joining in-flight full load");
                    (flight.id, flight.future.clone())
                }
                None => {
                    if !force {
                        let state = self.inner.state.read().await;
                        if !state.primary.is_empty() && !state.refresh.needs_refresh() {
                            return Ok(state.summary());
                        }
                    }
                    let id = self.inner.next_load_id.fetch_add(1, Ordering::Relaxed);
                    let cache = self.clone();
                    let future = async move { cache.run_full_load(id).await }
                        .boxed()
                        .shared();
                    *slot = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    (id, future)
                }
            }
        };

        let result = future.await;

        let mut slot = self.inner.in_flight.lock().await;
        if slot.as_ref().is_some_and(|flight| flight.id == id) {
            *slot = None;
        }
        result
    }

    /// Full load ignoring freshness.
    pub async fn force_refresh(&self) -> RosterResult<LoadSummary> {
        self.load_all(true).await
    }

    async fn run_full_load(&self, load_id: u64) -> RosterResult<LoadSummary> {
        self.inner.loading.store(true, Ordering::SeqCst);
        CacheCounters::bump(&self.inner.counters.full_loads);
        let result = self.full_load_pass(load_id).await;
        self.inner.loading.store(false, Ordering::SeqCst);
        result
    }

    async fn full_load_pass(&self, load_id: u64) -> RosterResult<LoadSummary> {
        info!(load_id, "Starting full directory load");

        let partitions = match self.inner.registry.list_partitions().await {
            Ok(partitions) => partitions,
            Err(err) => {
                error!(load_id, error = %err, "Partition registry unavailable, keeping current cache");
                self.inner.state.write().await.last_refresh_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        let names = loadable_partitions(&partitions);

        {
            let mut state = self.inner.state.write().await;
            state.clear_indices();
            state.refresh.reset();
        }

        let results = join_all(names.iter().map(|p| self.try_load_partition(p))).await;
        let mut failed_partitions = Vec::new();
        for (partition, result) in names.iter().zip(results) {
            if let Err(err) = result {
                warn!(load_id, partition = %partition, error = %err, "Partition load failed during full load");
                failed_partitions.push(partition.clone());
            }
        }

        let mut state = self.inner.state.write().await;
        state.refresh.mark_refreshed(Utc::now());
        state.last_refresh_error = None;
        let summary = LoadSummary {
            failed_partitions,
            ..state.summary()
        };
        info!(
            load_id,
            total_records = summary.total_records,
            partitions_loaded = summary.partitions_loaded,
            failed = summary.failed_partitions.len(),
            "Full directory load complete"
        );
        Ok(summary)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    async fn cached_primary(&self, id: &str) -> Option<Arc<Record>> {
        self.inner.state.read().await.primary.get(id).cloned()
    }

    async fn cached_secondary(&self, key: &str) -> Option<Arc<Record>> {
        self.inner.state.read().await.secondary.get(key).cloned()
    }

    /// Look up a record by primary key, smart loading its partition on a miss.
    pub async fn search_by_primary(&self, id: &str) -> LookupResult {
        let id = normalize_identifier(id);
        if let Some(record) = self.cached_primary(id).await {
            CacheCounters::bump(&self.inner.counters.hits);
            return LookupResult::from_cache(&record);
        }
        CacheCounters::bump(&self.inner.counters.misses);

        let report = self.smart_load(&[id]).await;
        if let Some(record) = self.cached_primary(id).await {
            return LookupResult::from_storage(&record);
        }
        match report.failed.first() {
            Some((partition, reason)) => {
                LookupResult::failed(RosterError::partition_load(partition.clone(), reason).to_string())
            }
            None => LookupResult::not_found(),
        }
    }

    /// Look up a record by secondary key.
    ///
    /// Secondary keys do not route, so a miss on an empty or stale cache
    /// triggers a full load; a miss on a fresh cache is final.
    pub async fn search_by_secondary(&self, key: &str) -> LookupResult {
        let key = normalize_identifier(key);
        if let Some(record) = self.cached_secondary(key).await {
            CacheCounters::bump(&self.inner.counters.hits);
            return LookupResult::from_cache(&record);
        }
        CacheCounters::bump(&self.inner.counters.misses);

        let cold = {
            let state = self.inner.state.read().await;
            state.primary.is_empty() || state.refresh.needs_refresh()
        };
        if !cold {
            return LookupResult::not_found();
        }
        if let Err(err) = self.load_all(false).await {
            return LookupResult::failed(err.to_string());
        }
        match self.cached_secondary(key).await {
            Some(record) => LookupResult::from_storage(&record),
            None => LookupResult::not_found(),
        }
    }

    /// Resolve many primary keys after a single smart load.
    ///
    /// Each occurrence of an id is resolved independently. Ids whose
    /// partition failed to load are reported as item errors; the load report
    /// is returned so callers can judge whether anything was readable.
    pub async fn batch_search_by_primary<S: AsRef<str>>(&self, ids: &[S]) -> CachedBatch {
        let report = self.smart_load(ids).await;

        let router = self.router();
        let mut outcome = BatchOutcome::default();
        let (mut hits, mut misses) = (0u64, 0u64);
        {
            let state = self.inner.state.read().await;
            for raw in ids {
                let id = normalize_identifier(raw.as_ref());
                if let Some(record) = state.primary.get(id) {
                    hits += 1;
                    outcome.push_found(raw.as_ref(), record);
                    continue;
                }
                misses += 1;
                let failure = router
                    .target_partition(id)
                    .and_then(|partition| report.failure_for(partition));
                match failure {
                    Some(reason) => outcome.errors.push(BatchItemError::new(raw.as_ref(), reason)),
                    None => outcome.not_found.push(raw.as_ref().to_string()),
                }
            }
        }
        self.inner.counters.hits.fetch_add(hits, Ordering::Relaxed);
        self.inner.counters.misses.fetch_add(misses, Ordering::Relaxed);

        CachedBatch {
            outcome,
            load_report: report,
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Snapshot of sizes, freshness and counters.
    pub async fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let state = self.inner.state.read().await;
        let mut stats = CacheStats {
            total_records: state.primary.len(),
            total_by_secondary: state.secondary.len(),
            partitions_loaded: state.partitions.len(),
            last_full_refresh: state.refresh.last_full_refresh(),
            needs_refresh: state.refresh.needs_refresh_at(now),
            is_loading: self.is_loading(),
            cache_age_ms: state
                .refresh
                .last_full_refresh()
                .map(|at| (now - at).num_milliseconds().max(0)),
            last_refresh_error: state.last_refresh_error.clone(),
            ..Default::default()
        };
        self.inner.counters.fill(&mut stats);
        stats
    }

    /// Records indexed by primary key.
    pub async fn record_count(&self) -> usize {
        self.inner.state.read().await.primary.len()
    }

    pub async fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now()).await
    }

    /// Whether a full refresh is due as of `now`.
    pub async fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.inner.state.read().await.refresh.needs_refresh_at(now)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    pub async fn is_partition_loaded(&self, partition: &str) -> bool {
        self.inner.state.read().await.partitions.contains_key(partition)
    }

    /// Loaded partition names, sorted.
    pub async fn loaded_partitions(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .state
            .read()
            .await
            .partitions
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }

    /// Drop every index and the refresh time.
    pub async fn clear(&self) {
        let mut state = self.inner.state.write().await;
        let dropped = state.primary.len();
        state.clear_indices();
        state.refresh.reset();
        state.last_refresh_error = None;
        info!(records = dropped, "Directory cache cleared");
    }
}

impl std::fmt::Debug for DirectoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryCache")
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::store::PartitionInfo;
    use async_trait::async_trait;
    use roster_core::{fields, Document, FilterExpr, StoreError, StoreResult};
    use std::sync::atomic::AtomicUsize;

    /// Store double counting queries, with one optionally failing partition.
    struct CountingStore {
        inner: InMemoryStore,
        queries: AtomicUsize,
        failing: Option<String>,
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn query(&self, partition: &str, filters: &[FilterExpr]) -> StoreResult<Vec<Document>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.failing.as_deref() == Some(partition) {
                return Err(StoreError::Unavailable {
                    partition: partition.to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            self.inner.query(partition, filters).await
        }
    }

    #[async_trait]
    impl PartitionRegistry for CountingStore {
        async fn list_partitions(&self) -> StoreResult<Vec<PartitionInfo>> {
            self.inner.list_partitions().await
        }
    }

    fn student(admission: &str, roll: &str) -> Document {
        Document::new(format!("doc-{admission}"))
            .with_field(fields::ADMISSION_NUMBER, admission)
            .with_field(fields::ROLL_NUMBER, roll)
            .with_field(fields::ACTIVE, true)
    }

    fn setup(failing: Option<&str>) -> (DirectoryCache, Arc<CountingStore>) {
        let inner = InMemoryStore::new();
        inner.insert_document("students_cse_1", student("22015112001", "CS001"));
        inner.insert_document("students_cse_1", student("22015112002", "CS002"));
        inner.insert_document("students_it_1", student("22016112001", "IT001"));
        let store = Arc::new(CountingStore {
            inner,
            queries: AtomicUsize::new(0),
            failing: failing.map(str::to_string),
        });
        let cache = DirectoryCache::new(store.clone(), store.clone(), CacheConfig::default());
        (cache, store)
    }

    #[tokio::test]
    async fn test_load_partition_is_idempotent() {
        let (cache, store) = setup(None);
        let first = cache.load_partition("students_cse_1").await;
        let second = cache.load_partition("students_cse_1").await;
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(store.queries.load(Ordering::SeqCst), 1);
        assert!(cache.is_partition_loaded("students_cse_1").await);
    }

    #[tokio::test]
    async fn test_failed_partition_yields_empty_and_stays_unloaded() {
        let (cache, _) = setup(Some("students_cse_1"));
        assert!(cache.load_partition("students_cse_1").await.is_empty());
        assert!(!cache.is_partition_loaded("students_cse_1").await);
    }

    #[tokio::test]
    async fn test_smart_load_only_touches_routed_partitions() {
        let (cache, store) = setup(None);
        let report = cache
            .smart_load(&["22015112001", "22015112002", "invalid123"])
            .await;
        assert_eq!(report.requested_partitions, vec!["students_cse_1".to_string()]);
        assert_eq!(report.loaded, vec!["students_cse_1".to_string()]);
        assert_eq!(report.unroutable, vec!["invalid123".to_string()]);
        assert_eq!(store.queries.load(Ordering::SeqCst), 1);
        assert!(!cache.is_partition_loaded("students_it_1").await);
        // Smart loads never make the cache fresh.
        assert!(cache.needs_refresh().await);
    }

    #[tokio::test]
    async fn test_search_by_primary_hit_after_miss() {
        let (cache, _) = setup(None);
        let first = cache.search_by_primary("22015112001").await;
        assert!(first.found);
        assert!(!first.from_cache);
        let second = cache.search_by_primary("22015112001").await;
        assert!(second.from_cache);

        let missing = cache.search_by_primary("22015112999").await;
        assert!(!missing.found);
        assert!(missing.error.is_none());
    }

    #[tokio::test]
    async fn test_search_by_secondary_triggers_full_load() {
        let (cache, _) = setup(None);
        let result = cache.search_by_secondary("IT001").await;
        assert!(result.found);
        assert_eq!(
            result.record.map(|r| r.partition_name),
            Some("students_it_1".to_string())
        );
        assert!(!cache.needs_refresh().await);

        // Fresh cache: a miss is final and does not reload.
        let missing = cache.search_by_secondary("NOPE").await;
        assert!(!missing.found);
        assert_eq!(cache.stats().await.full_loads, 1);
    }

    #[tokio::test]
    async fn test_load_all_and_freshness() {
        let (cache, store) = setup(None);
        let summary = cache.load_all(false).await.unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.partitions_loaded, 2);
        assert!(!cache.needs_refresh().await);

        let later = Utc::now() + chrono::Duration::seconds(301);
        assert!(cache.needs_refresh_at(later).await);

        // Fresh and non-empty: no store traffic.
        let queries = store.queries.load(Ordering::SeqCst);
        let again = cache.load_all(false).await.unwrap();
        assert_eq!(again.total_records, 3);
        assert_eq!(store.queries.load(Ordering::SeqCst), queries);
    }

    #[tokio::test]
    async fn test_batch_reports_failed_partition_as_item_errors() {
        let (cache, _) = setup(Some("students_cse_1"));
        let batch = cache
            .batch_search_by_primary(&["22015112001", "22016112001", "bogus"])
            .await;
        assert_eq!(batch.outcome.found.len(), 1);
        assert_eq!(batch.outcome.errors.len(), 1);
        assert_eq!(batch.outcome.errors[0].id, "22015112001");
        assert_eq!(batch.outcome.not_found, vec!["bogus".to_string()]);
        assert_eq!(batch.outcome.total(), 3);
    }

    #[tokio::test]
    async fn test_batch_with_every_partition_failed_is_still_reported() {
        let (cache, _) = setup(Some("students_cse_1"));
        let batch = cache.batch_search_by_primary(&["22015112001", "bogus"]).await;
        assert_eq!(batch.outcome.errors.len(), 1);
        assert_eq!(batch.outcome.not_found, vec!["bogus".to_string()]);
        assert_eq!(batch.load_report.failed.len(), 1);
        // The store reason is kept as is, without a partition prefix.
        let reason = &batch.load_report.failed[0].1;
        assert!(!reason.starts_with("Failed to load partition"));
        assert_eq!(batch.outcome.errors[0].message, *reason);
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let (cache, _) = setup(None);
        cache.load_all(false).await.unwrap();
        cache.clear().await;
        let stats = cache.stats().await;
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.total_by_secondary, 0);
        assert_eq!(stats.partitions_loaded, 0);
        assert!(stats.last_full_refresh.is_none());
        assert!(stats.needs_refresh);
    }

    #[tokio::test]
    async fn test_duplicate_primary_key_is_flagged() {
        let (cache, store) = setup(None);
        store
            .inner
            .insert_document("students_it_1", student("22015112001", "DUP"));
        cache.load_all(false).await.unwrap();
        assert_eq!(cache.stats().await.duplicate_primary_keys, 1);
    }
}
