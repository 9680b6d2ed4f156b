//! Search Orchestrator: picks a strategy per batch and runs it.
//!
//! # Paths
//!
//! - **Cached**: one smart load of the target partitions, then every id is
//!   answered from the directory cache.
//! - **Direct**: ids are grouped by routed partition and fetched with `in`
//!   queries of at most `query_chunk_size` ids. Nothing enters the cache.
//!
//! Both paths finish with the same fallback scan. Ids that did not route,
//! or were missing from their routed partition, are looked for in every
//! other partition in scan order, first match wins.
//!
//! # Failures
//!
//! An unreadable partition turns the ids it owns into item errors and the
//! run carries on. A path fails as a whole only when it made store reads and
//! every one of them failed.
//!
//! # Duplicates
//!
//! Every occurrence of an id in the input is reported on its own, in input
//! order. The direct path queries each distinct id once and expands the
//! results back per occurrence.

use std::collections::{HashMap, HashSet};

use futures_util::future::join_all;
use roster_core::{normalize_identifier, Record, RosterError, RosterResult, StoreResult};
use roster_storage::{
    BatchItemError, BatchOutcome, DirectoryCache, FoundRecord, LookupResult, SmartLoadReport,
};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::fallback::{scan_order, ChainOutcome, LookupChain};
use crate::strategy::{choose_strategy, CacheSnapshot, SearchMethod, SearchOptions, StrategyDecision};

/// How one distinct id was resolved.
#[derive(Debug, Clone)]
enum Resolution {
    Found(Record),
    NotFound,
    Failed(String),
}

/// Store reads made by one path run.
#[derive(Debug, Default)]
struct ReadTally {
    succeeded: usize,
    failed: usize,
    first_error: Option<RosterError>,
}

impl ReadTally {
    fn from_report(report: &SmartLoadReport) -> Self {
        let mut tally = Self {
            succeeded: report.loaded.len() + report.already_loaded.len(),
            ..Default::default()
        };
        for (partition, reason) in &report.failed {
            tally.failure(RosterError::partition_load(partition.clone(), reason));
        }
        tally
    }

    fn success(&mut self) {
        self.succeeded += 1;
    }

    fn failure(&mut self, err: impl Into<RosterError>) {
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(err.into());
        }
    }

    fn absorb(&mut self, other: ReadTally) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        if self.first_error.is_none() {
            self.first_error = other.first_error;
        }
    }

    fn finish(self, outcome: BatchOutcome) -> RosterResult<BatchOutcome> {
        match self.first_error {
            Some(err) if self.succeeded == 0 => Err(err),
            _ => Ok(outcome),
        }
    }
}

struct ScanOutcome {
    resolved: HashMap<String, Resolution>,
    reads: ReadTally,
}

/// Outcome of [`SearchOrchestrator::smart_batch_search`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun {
    pub outcome: BatchOutcome,
    /// What the decision table picked.
    pub decision: StrategyDecision,
    /// The path that produced `outcome`.
    pub method: SearchMethod,
    /// Whether the picked path failed and the other one answered.
    pub fell_back: bool,
}

/// Chooses and runs lookup strategies over a directory cache.
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    cache: DirectoryCache,
    config: SearchConfig,
}

fn distinct_ids<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .map(|id| normalize_identifier(id.as_ref()))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

impl SearchOrchestrator {
    pub fn new(cache: DirectoryCache, config: SearchConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Cache figures for the decision table.
    pub async fn cache_snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            total_records: self.cache.record_count().await,
            needs_refresh: self.cache.needs_refresh().await,
        }
    }

    /// Decide the path for a batch of `batch_size` ids.
    pub async fn choose_strategy(&self, batch_size: usize, options: &SearchOptions) -> StrategyDecision {
        let snapshot = self.cache_snapshot().await;
        let decision = choose_strategy(batch_size, snapshot, options, &self.config);
        debug!(
            batch_size,
            cached_records = snapshot.total_records,
            needs_refresh = snapshot.needs_refresh,
            method = %decision.method,
            reason = %decision.reason,
            "Strategy selected"
        );
        decision
    }

    /// Pick a path and run it, trying the other path once if it fails.
    pub async fn smart_batch_search<S: AsRef<str>>(
        &self,
        ids: &[S],
        options: &SearchOptions,
    ) -> RosterResult<BatchRun> {
        let decision = self.choose_strategy(ids.len(), options).await;
        let method = decision.method;

        let primary_err = match self.run(method, ids).await {
            Ok(outcome) => {
                return Ok(BatchRun {
                    outcome,
                    decision,
                    method,
                    fell_back: false,
                })
            }
            Err(err) => err,
        };

        let fallback = method.other();
        warn!(
            method = %method,
            fallback = %fallback,
            error = %primary_err,
            "Search path failed, trying the other path"
        );
        match self.run(fallback, ids).await {
            Ok(outcome) => Ok(BatchRun {
                outcome,
                decision,
                method: fallback,
                fell_back: true,
            }),
            Err(fallback_err) => Err(RosterError::AllStrategiesFailed {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            }),
        }
    }

    /// Run one path.
    pub async fn run<S: AsRef<str>>(&self, method: SearchMethod, ids: &[S]) -> RosterResult<BatchOutcome> {
        match method {
            SearchMethod::Cached => self.cached_batch_search(ids).await,
            SearchMethod::Direct => self.direct_batch_search(ids).await,
        }
    }

    /// Answer a batch from the cache after one smart load, then scan for misses.
    pub async fn cached_batch_search<S: AsRef<str>>(&self, ids: &[S]) -> RosterResult<BatchOutcome> {
        let batch = self.cache.batch_search_by_primary(ids).await;
        let mut reads = ReadTally::from_report(&batch.load_report);
        let mut outcome = batch.outcome;
        if outcome.not_found.is_empty() {
            return reads.finish(outcome);
        }

        let misses = std::mem::take(&mut outcome.not_found);
        let scan = self.fallback_scan(&distinct_ids(&misses)).await;
        reads.absorb(scan.reads);
        for raw in misses {
            match scan.resolved.get(normalize_identifier(&raw)) {
                Some(Resolution::Found(record)) => outcome.found.push(FoundRecord {
                    id: raw,
                    record: record.clone(),
                }),
                Some(Resolution::Failed(reason)) => {
                    outcome.errors.push(BatchItemError::new(raw, reason))
                }
                Some(Resolution::NotFound) | None => outcome.not_found.push(raw),
            }
        }
        reads.finish(outcome)
    }

    /// Query routed partitions directly in chunks, then scan for misses.
    ///
    /// A failed chunk turns its ids into item errors and the remaining ids
    /// are still resolved.
    pub async fn direct_batch_search<S: AsRef<str>>(&self, ids: &[S]) -> RosterResult<BatchOutcome> {
        let router = self.cache.router();
        let distinct = distinct_ids(ids);

        let mut groups: Vec<(&'static str, Vec<String>)> = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for id in &distinct {
            match router.target_partition(id) {
                Some(partition) => match groups.iter_mut().find(|(name, _)| *name == partition) {
                    Some((_, group)) => group.push(id.clone()),
                    None => groups.push((partition, vec![id.clone()])),
                },
                None => pending.push(id.clone()),
            }
        }

        let group_results = join_all(
            groups
                .iter()
                .map(|(partition, group)| self.query_partition(partition, group)),
        )
        .await;

        let mut resolved: HashMap<String, Resolution> = HashMap::with_capacity(distinct.len());
        let mut reads = ReadTally::default();
        for ((partition, _), chunk_results) in groups.iter().zip(group_results) {
            for (chunk, result) in chunk_results {
                match result {
                    Ok(records) => {
                        reads.success();
                        let mut by_key: HashMap<String, Record> = records
                            .into_iter()
                            .map(|r| (r.primary_key.clone(), r))
                            .collect();
                        for id in chunk {
                            match by_key.remove(id) {
                                Some(record) => {
                                    resolved.insert(id.clone(), Resolution::Found(record));
                                }
                                None => pending.push(id.clone()),
                            }
                        }
                    }
                    Err(err) => {
                        warn!(partition = %partition, ids = chunk.len(), error = %err, "Direct query failed");
                        for id in chunk {
                            resolved.insert(id.clone(), Resolution::Failed(err.to_string()));
                        }
                        reads.failure(err);
                    }
                }
            }
        }

        debug!(
            distinct = distinct.len(),
            partitions = groups.len(),
            chunks = reads.succeeded + reads.failed,
            failed_chunks = reads.failed,
            pending = pending.len(),
            "Direct queries finished"
        );
        if !pending.is_empty() {
            let scan = self.fallback_scan(&pending).await;
            reads.absorb(scan.reads);
            resolved.extend(scan.resolved);
        }
        reads.finish(expand(ids, &resolved))
    }

    /// Fetch `ids` from `partition` in chunks, concurrently.
    async fn query_partition<'a>(
        &self,
        partition: &str,
        ids: &'a [String],
    ) -> Vec<(&'a [String], StoreResult<Vec<Record>>)> {
        let chunks: Vec<&'a [String]> = ids.chunks(self.config.query_chunk_size.max(1)).collect();
        let loader = self.cache.loader();
        let results = join_all(
            chunks
                .iter()
                .copied()
                .map(|chunk| loader.fetch_by_primary(partition, chunk)),
        )
        .await;
        chunks.into_iter().zip(results).collect()
    }

    /// Look for `pending` ids across partitions in scan order.
    ///
    /// Each id skips its routed partition, which was already read. A
    /// partition is queried only for ids still unresolved, so every id stops
    /// at its first match. An id that was never found while some partition
    /// could not be read is reported as failed rather than not found.
    async fn fallback_scan(&self, pending: &[String]) -> ScanOutcome {
        let router = self.cache.router();
        let order = scan_order(self.cache.registry(), router).await;
        let chains: Vec<(&String, LookupChain)> = pending
            .iter()
            .map(|id| (id, LookupChain::for_identifier(id, router, &order).scan_only()))
            .collect();

        let mut resolved: HashMap<String, Resolution> = HashMap::with_capacity(pending.len());
        let mut failures: HashMap<String, Vec<String>> = HashMap::new();
        let mut reads = ReadTally::default();
        for partition in &order {
            let batch: Vec<String> = chains
                .iter()
                .filter(|(id, chain)| !resolved.contains_key(id.as_str()) && chain.covers(partition))
                .map(|(id, _)| (*id).clone())
                .collect();
            if batch.is_empty() {
                if resolved.len() == chains.len() {
                    break;
                }
                continue;
            }

            for (chunk, result) in self.query_partition(partition, &batch).await {
                match result {
                    Ok(records) => {
                        reads.success();
                        for record in records {
                            if chunk.contains(&record.primary_key)
                                && !resolved.contains_key(&record.primary_key)
                            {
                                info!(id = %record.primary_key, partition = %partition, "Found by fallback scan");
                                resolved.insert(record.primary_key.clone(), Resolution::Found(record));
                            }
                        }
                    }
                    Err(err) => {
                        warn!(partition = %partition, error = %err, "Fallback scan query failed");
                        for id in chunk {
                            failures
                                .entry(id.clone())
                                .or_default()
                                .push(err.to_string());
                        }
                        reads.failure(err);
                    }
                }
            }
        }

        for (id, _) in &chains {
            if resolved.contains_key(id.as_str()) {
                continue;
            }
            let resolution = match failures.get(id.as_str()) {
                Some(reasons) => Resolution::Failed(format!(
                    "not found, {} partition(s) unreadable: {}",
                    reasons.len(),
                    reasons.join("; ")
                )),
                None => Resolution::NotFound,
            };
            resolved.insert((*id).clone(), resolution);
        }
        ScanOutcome { resolved, reads }
    }

    /// Point lookup across every partition except the routed one.
    pub async fn scan_for(&self, id: &str) -> LookupResult {
        let id = normalize_identifier(id);
        let router = self.cache.router();
        let order = scan_order(self.cache.registry(), router).await;
        let chain = LookupChain::for_identifier(id, router, &order).scan_only();
        let loader = self.cache.loader();

        let outcome = chain
            .first_match(|step| {
                let partition = step.partition().to_string();
                async move {
                    loader
                        .fetch_by_primary(&partition, &[id])
                        .await
                        .map(|records| records.into_iter().find(|r| r.primary_key == id))
                }
            })
            .await;

        match outcome {
            ChainOutcome::Found { value, step } => {
                info!(id = %id, partition = %step.partition(), "Found by fallback scan");
                LookupResult::from_storage(&value)
            }
            ChainOutcome::NotFound => LookupResult::not_found(),
            ChainOutcome::Failed { errors } => LookupResult::failed(format!(
                "not found, {} partition(s) unreadable",
                errors.len()
            )),
        }
    }
}

/// Report each input occurrence from the per-id resolutions.
fn expand<S: AsRef<str>>(ids: &[S], resolved: &HashMap<String, Resolution>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for raw in ids {
        let raw = raw.as_ref();
        match resolved.get(normalize_identifier(raw)) {
            Some(Resolution::Found(record)) => outcome.found.push(FoundRecord {
                id: raw.to_string(),
                record: record.clone(),
            }),
            Some(Resolution::Failed(reason)) => outcome.errors.push(BatchItemError::new(raw, reason)),
            Some(Resolution::NotFound) | None => outcome.not_found.push(raw.to_string()),
        }
    }
    outcome
}
