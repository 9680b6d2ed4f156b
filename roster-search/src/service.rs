//! Directory Service
//!
//! The consumer-facing facade. One instance owns a directory cache, a search
//! orchestrator and a performance monitor, all built from injected store and
//! registry clients. Instances are independent: nothing is shared through
//! global state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use roster_core::{
    normalize_identifier, DepartmentInfo, HealthCheck, RosterError, RosterResult,
};
use roster_storage::{
    BatchItemError, CacheStats, DirectoryCache, DocumentStore, LoadSummary, LookupResult,
    PartitionRegistry,
};
use tracing::{error, info, warn};

use crate::chunked::{chunked_run, ChunkOptions};
use crate::config::SearchConfig;
use crate::constants::COMPONENT_NAME;
use crate::monitor::{PerformanceMonitor, PerformanceReport, SampleTags};
use crate::orchestrator::{BatchRun, SearchOrchestrator};
use crate::strategy::SearchOptions;
use crate::types::{BatchSearchResult, ChunkSummary, ChunkedSearchResult};

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Student directory lookups over a partitioned backing store.
#[derive(Debug)]
pub struct DirectoryService {
    orchestrator: SearchOrchestrator,
    monitor: PerformanceMonitor,
    initialized: AtomicBool,
}

impl DirectoryService {
    /// Build a service over `store` and `registry`.
    ///
    /// Fails if `config` is out of range.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<dyn PartitionRegistry>,
        config: SearchConfig,
    ) -> RosterResult<Self> {
        config.validate()?;
        let cache = DirectoryCache::new(store, registry, config.cache_config());
        Self::with_cache(cache, config)
    }

    /// Build a service around an existing cache.
    pub fn with_cache(cache: DirectoryCache, config: SearchConfig) -> RosterResult<Self> {
        config.validate()?;
        let monitor = PerformanceMonitor::new(cache.clone(), config.monitor_history)?;
        Ok(Self {
            orchestrator: SearchOrchestrator::new(cache, config),
            monitor,
            initialized: AtomicBool::new(false),
        })
    }

    pub fn cache(&self) -> &DirectoryCache {
        self.orchestrator.cache()
    }

    pub fn orchestrator(&self) -> &SearchOrchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &SearchConfig {
        self.orchestrator.config()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start the service, running a full load first when configured to.
    ///
    /// Calling it again is a no-op. A failed preload is returned and leaves
    /// the service usable with a cold cache.
    pub async fn init(&self) -> RosterResult<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if self.config().preload_on_init {
            let summary = self.preload().await.inspect_err(|err| {
                error!(error = %err, "Preload on init failed");
            })?;
            info!(
                records = summary.total_records,
                partitions = summary.partitions_loaded,
                "Directory service initialized with preload"
            );
        } else {
            info!("Directory service initialized");
        }
        Ok(())
    }

    /// Drop the cache and log final figures.
    pub async fn shutdown(&self) {
        let stats = self.cache().stats().await;
        let report = self.monitor.report();
        info!(
            records = stats.total_records,
            partitions = stats.partitions_loaded,
            hits = stats.hits,
            misses = stats.misses,
            operations = report.operations,
            avg_duration_ms = report.avg_duration_ms,
            "Directory service shutting down"
        );
        self.cache().clear().await;
        self.initialized.store(false, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Look up one student by admission number.
    ///
    /// A miss in the routed partition (or an id that does not route) is
    /// followed by a scan of the other partitions.
    pub async fn search_by_primary(&self, id: &str) -> LookupResult {
        let id = normalize_identifier(id);
        let lookup = async {
            let result = self.cache().search_by_primary(id).await;
            if result.found || result.error.is_some() {
                return result;
            }
            self.orchestrator.scan_for(id).await
        };
        self.monitor
            .monitor("search_by_primary", 1, lookup, |r| SampleTags {
                method: None,
                success: r.error.is_none(),
            })
            .await
    }

    /// Look up one student by roll number.
    pub async fn search_by_secondary(&self, key: &str) -> LookupResult {
        self.monitor
            .monitor(
                "search_by_secondary",
                1,
                self.cache().search_by_secondary(key),
                |r| SampleTags {
                    method: None,
                    success: r.error.is_none(),
                },
            )
            .await
    }

    /// Resolve a batch of admission numbers on the path the decision table picks.
    pub async fn batch_search<S: AsRef<str>>(
        &self,
        ids: &[S],
        options: &SearchOptions,
    ) -> RosterResult<BatchSearchResult> {
        let started = Instant::now();
        let run = self
            .monitor
            .monitor(
                "batch_search",
                ids.len(),
                self.orchestrator.smart_batch_search(ids, options),
                |r: &RosterResult<BatchRun>| {
                    SampleTags::from_result(r).with_method(r.as_ref().ok().map(|run| run.method))
                },
            )
            .await?;

        let result = BatchSearchResult::from_run(run, elapsed_ms(started));
        info!(
            ids = ids.len(),
            found = result.found.len(),
            not_found = result.not_found.len(),
            errors = result.errors.len(),
            method = %result.method,
            fell_back = result.fell_back,
            duration_ms = result.duration_ms,
            "Batch search finished"
        );
        Ok(result)
    }

    /// Resolve a large batch in paced chunks of `run_chunk_size` ids.
    ///
    /// Each chunk picks its own path. A chunk that fails on both paths
    /// reports each of its ids as an item error and the run continues.
    pub async fn batch_search_chunked<S: AsRef<str>>(
        &self,
        ids: &[S],
        options: &SearchOptions,
    ) -> ChunkedSearchResult {
        let started = Instant::now();
        let ids: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
        let chunk_options = ChunkOptions::new(self.config().run_chunk_size, self.config().chunk_delay);
        let options = *options;

        let mut next_index = 0;
        let run = chunked_run(&ids, chunk_options, |chunk| {
            let chunk_index = next_index;
            next_index += 1;
            let len = chunk.len();
            async move {
                let run = self
                    .monitor
                    .monitor(
                        "batch_search_chunk",
                        len,
                        self.orchestrator.smart_batch_search(&chunk, &options),
                        |r: &RosterResult<BatchRun>| {
                            SampleTags::from_result(r)
                                .with_method(r.as_ref().ok().map(|run| run.method))
                        },
                    )
                    .await?;
                Ok::<_, RosterError>((chunk_index, len, run))
            }
        })
        .await;

        let mut result = ChunkedSearchResult::default();
        let mut summaries: Vec<ChunkSummary> = Vec::with_capacity(run.chunks);
        for (chunk_index, len, batch) in run.results {
            summaries.push(ChunkSummary {
                chunk_index,
                ids: len,
                method: Some(batch.method),
                fell_back: batch.fell_back,
                error: None,
            });
            result.absorb(batch.outcome);
        }
        for failed in run.errors {
            let message = failed.error.to_string();
            summaries.push(ChunkSummary {
                chunk_index: failed.chunk_index,
                ids: failed.ids.len(),
                method: None,
                fell_back: false,
                error: Some(message.clone()),
            });
            result
                .errors
                .extend(failed.ids.into_iter().map(|id| BatchItemError::new(id, &message)));
        }
        summaries.sort_by_key(|s| s.chunk_index);
        result.chunks = summaries;
        result.duration_ms = elapsed_ms(started);

        if result.failed_chunks() > 0 {
            warn!(
                chunks = result.chunks.len(),
                failed = result.failed_chunks(),
                "Chunked batch search finished with failed chunks"
            );
        }
        result
    }

    // ========================================================================
    // Cache control
    // ========================================================================

    /// Full load unless the cache is already fresh.
    pub async fn preload(&self) -> RosterResult<LoadSummary> {
        self.monitor
            .monitor("preload", 0, self.cache().load_all(false), SampleTags::from_result)
            .await
    }

    /// Forced full load.
    pub async fn refresh(&self) -> RosterResult<LoadSummary> {
        self.monitor
            .monitor("refresh", 0, self.cache().force_refresh(), SampleTags::from_result)
            .await
    }

    pub async fn clear(&self) {
        self.cache().clear().await;
    }

    pub async fn get_stats(&self) -> CacheStats {
        self.cache().stats().await
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Healthy when fresh, degraded when empty or stale, unhealthy after a
    /// failed full refresh.
    pub async fn health(&self) -> HealthCheck {
        let stats = self.get_stats().await;
        let check = if let Some(reason) = &stats.last_refresh_error {
            HealthCheck::unhealthy(COMPONENT_NAME, format!("last full refresh failed: {}", reason))
        } else if stats.total_records == 0 {
            HealthCheck::degraded(COMPONENT_NAME, "cache is empty")
        } else if stats.needs_refresh {
            HealthCheck::degraded(COMPONENT_NAME, "cache is stale")
        } else {
            HealthCheck::healthy(COMPONENT_NAME)
        };
        check.with_cache(stats.total_records, stats.cache_age_ms)
    }

    pub fn performance_report(&self) -> PerformanceReport {
        self.monitor.report()
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Prometheus text exposition of this instance's metrics.
    pub fn render_metrics(&self) -> RosterResult<String> {
        self.monitor.render_metrics()
    }

    /// Department metadata for an admission number, if it routes.
    pub fn department_info(&self, id: &str) -> Option<DepartmentInfo> {
        self.cache()
            .router()
            .parse(normalize_identifier(id))
            .map(|parsed| parsed.department())
    }

    /// Department metadata for a partition name.
    pub fn department_for_partition(&self, partition: &str) -> Option<DepartmentInfo> {
        self.cache().router().department_for_partition(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::HealthStatus;
    use roster_test_utils::{fixtures, InstrumentedStore};

    fn service(store: &Arc<InstrumentedStore>, config: SearchConfig) -> DirectoryService {
        DirectoryService::new(store.clone(), store.clone(), config).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let store = Arc::new(fixtures::instrumented_store());
        let config = SearchConfig {
            query_chunk_size: 11,
            ..Default::default()
        };
        let result = DirectoryService::new(store.clone(), store, config);
        assert!(matches!(result, Err(RosterError::Config(_))));
    }

    #[tokio::test]
    async fn test_init_with_preload() {
        let store = Arc::new(fixtures::instrumented_store());
        let svc = service(
            &store,
            SearchConfig {
                preload_on_init: true,
                ..Default::default()
            },
        );
        svc.init().await.unwrap();
        assert!(svc.is_initialized());
        assert_eq!(svc.get_stats().await.total_records, 6);

        // Second init does nothing.
        store.reset_counts();
        svc.init().await.unwrap();
        assert_eq!(store.registry_count(), 0);

        svc.shutdown().await;
        assert!(!svc.is_initialized());
        assert_eq!(svc.get_stats().await.total_records, 0);
    }

    #[tokio::test]
    async fn test_search_by_primary_scans_on_miss() {
        let store = Arc::new(fixtures::instrumented_store());
        let svc = service(&store, SearchConfig::default());

        let legacy = svc.search_by_primary("LEGACY0001").await;
        assert!(legacy.found);
        assert!(!legacy.from_cache);

        let hit = svc.search_by_primary("22015112001").await;
        assert!(hit.found);
        let again = svc.search_by_primary("22015112001").await;
        assert!(again.from_cache);

        let missing = svc.search_by_primary("22015112777").await;
        assert!(!missing.found);
        assert!(missing.error.is_none());
        assert_eq!(svc.performance_report().operations, 4);
    }

    #[tokio::test]
    async fn test_health_transitions() {
        let store = Arc::new(fixtures::instrumented_store());
        let svc = service(&store, SearchConfig::default());
        assert_eq!(svc.health().await.status, HealthStatus::Degraded);

        svc.preload().await.unwrap();
        let healthy = svc.health().await;
        assert_eq!(healthy.status, HealthStatus::Healthy);
        assert_eq!(healthy.cached_records, 6);

        store.set_registry_down(true);
        assert!(svc.refresh().await.is_err());
        let unhealthy = svc.health().await;
        assert_eq!(unhealthy.status, HealthStatus::Unhealthy);
        // The previous data is still served.
        assert_eq!(unhealthy.cached_records, 6);
        assert!(svc.search_by_primary("22016112001").await.found);
    }

    #[tokio::test]
    async fn test_department_info() {
        let store = Arc::new(fixtures::instrumented_store());
        let svc = service(&store, SearchConfig::default());
        let info = svc.department_info(" 22015112001 ").unwrap();
        assert_eq!(info.partition, "students_cse_1");
        assert!(svc.department_info("invalid123").is_none());
        assert_eq!(
            svc.department_for_partition("students_it_1").unwrap().section_code,
            "61"
        );
    }
}
