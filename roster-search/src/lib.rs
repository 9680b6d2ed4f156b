//! Roster Search - Strategy Selection, Orchestration and the Directory Service
//!
//! Sits on top of the directory cache and answers student lookups:
//!
//! - [`strategy`] is the decision table picking the cached or direct path.
//! - [`fallback`] holds lookup chains, the partition order tried per id.
//! - [`orchestrator`] runs either path and falls back once to the other.
//! - [`chunked`] paces very large id lists.
//! - [`monitor`] measures operations and exports Prometheus metrics.
//! - [`service`] is the facade consumers hold.

pub mod chunked;
pub mod config;
pub mod constants;
pub mod fallback;
pub mod monitor;
pub mod orchestrator;
pub mod service;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use chunked::{chunked_run, chunked_run_with_progress, ChunkError, ChunkOptions, ChunkProgress, ChunkedRun};
pub use config::SearchConfig;
pub use fallback::{scan_order, ChainOutcome, LookupChain, LookupStep};
pub use monitor::{efficiency, OperationSample, PerformanceMonitor, PerformanceReport, SampleTags};
pub use orchestrator::{BatchRun, SearchOrchestrator};
pub use service::DirectoryService;
pub use strategy::{choose_strategy, CacheSnapshot, SearchMethod, SearchOptions, StrategyDecision};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
pub use types::{BatchSearchResult, ChunkSummary, ChunkedSearchResult};
