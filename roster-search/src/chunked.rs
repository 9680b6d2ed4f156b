//! Chunked runs over large id lists.
//!
//! Splits the ids into chunks, runs an operation per chunk sequentially and
//! sleeps between chunks so the backing store sees a bounded request rate.
//! A failed chunk is recorded and the run continues.

use std::future::Future;
use std::time::Duration;

use roster_core::{RosterError, RosterResult};
use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_CHUNK_DELAY, DEFAULT_RUN_CHUNK_SIZE};

/// Chunk size and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub chunk_size: usize,
    /// Pause between consecutive chunks.
    pub delay: Duration,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_RUN_CHUNK_SIZE,
            delay: DEFAULT_CHUNK_DELAY,
        }
    }
}

impl ChunkOptions {
    pub fn new(chunk_size: usize, delay: Duration) -> Self {
        Self { chunk_size, delay }
    }
}

/// Progress passed to the callback before each chunk runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkProgress {
    /// Zero based index of the chunk about to run.
    pub chunk_index: usize,
    pub total_chunks: usize,
    /// Ids handled by earlier chunks.
    pub processed: usize,
    pub total: usize,
}

/// A chunk whose operation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkError {
    pub chunk_index: usize,
    pub ids: Vec<String>,
    pub error: RosterError,
}

/// Per-chunk results and failures of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedRun<T> {
    pub results: Vec<T>,
    pub errors: Vec<ChunkError>,
    pub chunks: usize,
}

/// Run `op` over `ids` in chunks.
pub async fn chunked_run<T, F, Fut>(ids: &[String], options: ChunkOptions, op: F) -> ChunkedRun<T>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = RosterResult<T>>,
{
    chunked_run_with_progress(ids, options, |_| {}, op).await
}

/// Run `op` over `ids` in chunks, calling `progress` before each chunk.
pub async fn chunked_run_with_progress<T, F, Fut, P>(
    ids: &[String],
    options: ChunkOptions,
    mut progress: P,
    mut op: F,
) -> ChunkedRun<T>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = RosterResult<T>>,
    P: FnMut(ChunkProgress),
{
    let chunk_size = options.chunk_size.max(1);
    let total_chunks = ids.len().div_ceil(chunk_size);
    let mut run = ChunkedRun {
        results: Vec::with_capacity(total_chunks),
        errors: Vec::new(),
        chunks: total_chunks,
    };

    let mut processed = 0;
    for (chunk_index, chunk) in ids.chunks(chunk_size).enumerate() {
        if chunk_index > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
        progress(ChunkProgress {
            chunk_index,
            total_chunks,
            processed,
            total: ids.len(),
        });

        match op(chunk.to_vec()).await {
            Ok(result) => run.results.push(result),
            Err(error) => {
                warn!(chunk = chunk_index, ids = chunk.len(), error = %error, "Chunk failed");
                run.errors.push(ChunkError {
                    chunk_index,
                    ids: chunk.to_vec(),
                    error,
                });
            }
        }
        processed += chunk.len();
    }

    debug!(
        chunks = total_chunks,
        failed = run.errors.len(),
        total = ids.len(),
        "Chunked run finished"
    );
    run
}
