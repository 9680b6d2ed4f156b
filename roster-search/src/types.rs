//! Result types returned by the directory service.

use roster_storage::{BatchItemError, BatchOutcome, FoundRecord};
use serde::Serialize;

use crate::orchestrator::BatchRun;
use crate::strategy::SearchMethod;

/// Result of [`crate::DirectoryService::batch_search`].
///
/// Every input id appears in exactly one of `found`, `not_found` or `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSearchResult {
    pub found: Vec<FoundRecord>,
    pub not_found: Vec<String>,
    pub errors: Vec<BatchItemError>,
    /// Path that produced the result.
    pub method: SearchMethod,
    /// Why the decision table picked its path.
    pub reason: String,
    /// Whether the picked path failed and the other one answered.
    pub fell_back: bool,
    pub duration_ms: u64,
}

impl BatchSearchResult {
    pub(crate) fn from_run(run: BatchRun, duration_ms: u64) -> Self {
        let BatchRun {
            outcome,
            decision,
            method,
            fell_back,
        } = run;
        Self {
            found: outcome.found,
            not_found: outcome.not_found,
            errors: outcome.errors,
            method,
            reason: decision.reason,
            fell_back,
            duration_ms,
        }
    }

    pub fn total(&self) -> usize {
        self.found.len() + self.not_found.len() + self.errors.len()
    }
}

/// What one chunk of a chunked search did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSummary {
    pub chunk_index: usize,
    pub ids: usize,
    /// `None` when the chunk failed on both paths.
    pub method: Option<SearchMethod>,
    pub fell_back: bool,
    pub error: Option<String>,
}

/// Result of [`crate::DirectoryService::batch_search_chunked`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkedSearchResult {
    pub found: Vec<FoundRecord>,
    pub not_found: Vec<String>,
    pub errors: Vec<BatchItemError>,
    pub chunks: Vec<ChunkSummary>,
    pub duration_ms: u64,
}

impl ChunkedSearchResult {
    pub(crate) fn absorb(&mut self, outcome: BatchOutcome) {
        self.found.extend(outcome.found);
        self.not_found.extend(outcome.not_found);
        self.errors.extend(outcome.errors);
    }

    pub fn total(&self) -> usize {
        self.found.len() + self.not_found.len() + self.errors.len()
    }

    /// Chunks that failed on both paths.
    pub fn failed_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.error.is_some()).count()
    }
}
