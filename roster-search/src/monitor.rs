//! Performance Monitor
//!
//! Wraps operations to measure wall-clock duration and how much the cache
//! grew while they ran. Samples are kept in a bounded history for reports
//! and mirrored into a per-instance Prometheus registry. The monitor never
//! changes the result or control flow of the wrapped operation.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use roster_core::{RosterError, RosterResult};
use roster_storage::DirectoryCache;
use serde::Serialize;
use tracing::debug;

use crate::constants::OPERATION_LATENCY_BUCKETS;
use crate::strategy::SearchMethod;

/// Tags attached to a sample once the operation has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTags {
    pub method: Option<SearchMethod>,
    pub success: bool,
}

impl SampleTags {
    /// Success from a result, no method.
    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        Self {
            method: None,
            success: result.is_ok(),
        }
    }

    pub fn with_method(mut self, method: Option<SearchMethod>) -> Self {
        self.method = method;
        self
    }
}

/// One measured operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSample {
    pub label: String,
    pub method: Option<SearchMethod>,
    /// Ids the operation was asked to resolve.
    pub ids: usize,
    pub duration_ms: f64,
    pub records_before: usize,
    pub records_after: usize,
    /// Growth of the cache during the operation.
    pub records_loaded: usize,
    /// `ids / (ids + records_loaded)`: 1.0 when nothing had to be loaded.
    pub efficiency: f64,
    pub success: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate over the sample history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub operations: usize,
    pub avg_duration_ms: f64,
    pub max_duration_ms: f64,
    pub avg_efficiency: f64,
    pub records_loaded: usize,
    /// Sample count per method name; untagged samples count as "none".
    pub by_method: BTreeMap<String, usize>,
}

/// Efficiency of resolving `ids` at the cost of loading `records_loaded`.
pub fn efficiency(ids: usize, records_loaded: usize) -> f64 {
    if ids + records_loaded == 0 {
        return 1.0;
    }
    ids as f64 / (ids + records_loaded) as f64
}

/// Measures operations against a directory cache.
pub struct PerformanceMonitor {
    cache: DirectoryCache,
    capacity: usize,
    history: Mutex<VecDeque<OperationSample>>,
    registry: Registry,
    operation_duration_seconds: HistogramVec,
    operations_total: CounterVec,
    records_loaded_total: IntCounter,
}

impl PerformanceMonitor {
    /// Create a monitor keeping at most `capacity` samples.
    pub fn new(cache: DirectoryCache, capacity: usize) -> RosterResult<Self> {
        let registry = Registry::new();

        let operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "roster_operation_duration_seconds",
                "Directory operation duration in seconds",
            )
            .buckets(OPERATION_LATENCY_BUCKETS.to_vec()),
            &["operation", "method"],
        )
        .map_err(|e| RosterError::Metrics(format!("Failed to create operation_duration_seconds: {}", e)))?;

        let operations_total = CounterVec::new(
            Opts::new("roster_operations_total", "Total directory operations"),
            &["operation", "method", "status"],
        )
        .map_err(|e| RosterError::Metrics(format!("Failed to create operations_total: {}", e)))?;

        let records_loaded_total = IntCounter::new(
            "roster_records_loaded_total",
            "Records added to the cache by monitored operations",
        )
        .map_err(|e| RosterError::Metrics(format!("Failed to create records_loaded_total: {}", e)))?;

        registry
            .register(Box::new(operation_duration_seconds.clone()))
            .and_then(|_| registry.register(Box::new(operations_total.clone())))
            .and_then(|_| registry.register(Box::new(records_loaded_total.clone())))
            .map_err(|e| RosterError::Metrics(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            cache,
            capacity: capacity.max(1),
            history: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            registry,
            operation_duration_seconds,
            operations_total,
            records_loaded_total,
        })
    }

    /// Run `op`, record a sample tagged by `tags`, and return `op`'s output.
    pub async fn monitor<T, Fut, C>(&self, label: &str, ids: usize, op: Fut, tags: C) -> T
    where
        Fut: Future<Output = T>,
        C: FnOnce(&T) -> SampleTags,
    {
        let records_before = self.cache.record_count().await;
        let started = Instant::now();
        let output = op.await;
        let elapsed = started.elapsed();
        let records_after = self.cache.record_count().await;

        let tags = tags(&output);
        let records_loaded = records_after.saturating_sub(records_before);
        let sample = OperationSample {
            label: label.to_string(),
            method: tags.method,
            ids,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            records_before,
            records_after,
            records_loaded,
            efficiency: efficiency(ids, records_loaded),
            success: tags.success,
            recorded_at: Utc::now(),
        };
        self.record(sample);
        output
    }

    fn record(&self, sample: OperationSample) {
        let method = sample.method.map(|m| m.as_str()).unwrap_or("none");
        let status = if sample.success { "success" } else { "error" };
        self.operation_duration_seconds
            .with_label_values(&[sample.label.as_str(), method])
            .observe(sample.duration_ms / 1000.0);
        self.operations_total
            .with_label_values(&[sample.label.as_str(), method, status])
            .inc();
        self.records_loaded_total.inc_by(sample.records_loaded as u64);

        debug!(
            operation = %sample.label,
            method,
            ids = sample.ids,
            duration_ms = sample.duration_ms,
            records_loaded = sample.records_loaded,
            efficiency = sample.efficiency,
            "Operation measured"
        );

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(sample);
    }

    /// Samples currently held, oldest first.
    pub fn samples(&self) -> Vec<OperationSample> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Aggregate the held samples.
    pub fn report(&self) -> PerformanceReport {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.is_empty() {
            return PerformanceReport::default();
        }

        let n = history.len() as f64;
        let mut report = PerformanceReport {
            operations: history.len(),
            ..Default::default()
        };
        let (mut total_duration, mut total_efficiency) = (0.0, 0.0);
        for sample in history.iter() {
            total_duration += sample.duration_ms;
            total_efficiency += sample.efficiency;
            report.max_duration_ms = report.max_duration_ms.max(sample.duration_ms);
            report.records_loaded += sample.records_loaded;
            let method = sample.method.map(|m| m.as_str()).unwrap_or("none");
            *report.by_method.entry(method.to_string()).or_default() += 1;
        }
        report.avg_duration_ms = total_duration / n;
        report.avg_efficiency = total_efficiency / n;
        report
    }

    /// Drop the sample history. Prometheus counters are not reset.
    pub fn reset(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Metrics in Prometheus text format.
    pub fn render_metrics(&self) -> RosterResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| RosterError::Metrics(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| RosterError::Metrics(format!("Metrics are not UTF-8: {}", e)))
    }

    /// The per-instance registry, for callers exporting metrics themselves.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
