//! Chunked, concurrent row processing
//!
//! This module provides the [`BatchProcessor`], which turns the data rows of
//! one upload into persisted transactions plus an aggregated error report.
//!
//! # Design
//!
//! Rows are split into fixed-size chunks. Every chunk becomes its own tokio
//! task that parses its rows and hands the resulting batch to the
//! [`TransactionSink`] in a single call:
//!
//! ```text
//! rows ──partition──► chunk 0 ──spawn──► parse ─► persist ─┐
//!                     chunk 1 ──spawn──► parse ─► persist ─┼─► join all ─► UploadReport
//!                     chunk N ──spawn──► parse ─► persist ─┘
//! ```
//!
//! A semaphore bounds how many chunks run at once. Every task is joined before
//! the report is returned, and a failing chunk never stops the others.
//!
//! # Row numbering
//!
//! Errors are keyed by the row's line in the uploaded file: the header is
//! line 1 and the first data row is line 2. A row keeps its number whatever
//! chunk size is used, so reports do not depend on chunking or on the order
//! chunks finish in.
//!
//! # Repeated rows
//!
//! Before chunking, every row is numbered among the rows whose mapped cells
//! are identical to its own (see [`occurrences`]). The number travels on the
//! transaction so the store keeps genuine repeats within one file apart while
//! a re-upload of the same file still maps onto the stored rows.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::header_resolver::FieldColumns;
use super::traits::TransactionSink;
use crate::strategy::{Row, RowParser};
use crate::types::StoreError;

/// Lines preceding the first data row
pub const HEADER_ROWS: u64 = 1;

/// Default number of rows per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Configuration for chunked processing
///
/// Controls how rows are split and how many chunks are persisted
/// concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of rows per chunk
    pub chunk_size: usize,
    /// Maximum number of chunks processing concurrently
    pub max_concurrent_chunks: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_chunks: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values are replaced by the defaults. The concurrency limit is
    /// capped at [`Semaphore::MAX_PERMITS`].
    pub fn new(chunk_size: usize, max_concurrent_chunks: usize) -> Self {
        let default = Self::default();

        let chunk_size = if chunk_size == 0 {
            warn!(
                chunk_size,
                default = default.chunk_size,
                "invalid chunk size, using default"
            );
            default.chunk_size
        } else {
            chunk_size
        };

        let max_concurrent_chunks = if max_concurrent_chunks == 0 {
            warn!(
                max_concurrent_chunks,
                default = default.max_concurrent_chunks,
                "invalid concurrency limit, using default"
            );
            default.max_concurrent_chunks
        } else if max_concurrent_chunks > Semaphore::MAX_PERMITS {
            warn!(
                max_concurrent_chunks,
                max = Semaphore::MAX_PERMITS,
                "concurrency limit too large, capping"
            );
            Semaphore::MAX_PERMITS
        } else {
            max_concurrent_chunks
        };

        Self {
            chunk_size,
            max_concurrent_chunks,
        }
    }
}

/// File line of the data row at `index` (0-based, header excluded)
pub fn row_number(index: usize) -> u64 {
    index as u64 + 1 + HEADER_ROWS
}

/// Number each row among the earlier rows with the same mapped cells
///
/// The parser only reads the trimmed cells at the mapped columns, so rows that
/// agree on those produce equal transactions. The first such row gets 0, the
/// next 1, and so on.
pub fn occurrences(rows: &[Row], columns: &FieldColumns) -> Vec<u32> {
    let mut seen: HashMap<Vec<Option<&str>>, u32> = HashMap::with_capacity(rows.len());
    rows.iter()
        .map(|row| {
            let cells = columns
                .iter()
                .flat_map(|(_, indices)| indices.iter())
                .map(|&index| row.get(index).map(|cell| cell.trim()))
                .collect();
            let count = seen.entry(cells).or_insert(0);
            let occurrence = *count;
            *count += 1;
            occurrence
        })
        .collect()
}

/// A chunk whose batch could not be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Zero-based chunk index
    pub chunk: usize,
    /// File line of the chunk's first row
    pub first_row: u64,
    /// File line of the chunk's last row
    pub last_row: u64,
    pub reason: String,
}

/// Aggregated outcome of one upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    /// File line → error messages of that row
    ///
    /// A row absent from the map was parsed and persisted without errors.
    pub row_errors: BTreeMap<u64, Vec<String>>,
    /// Chunks whose persistence call failed, in chunk order
    pub chunk_failures: Vec<ChunkFailure>,
    /// Rows turned into transactions
    pub parsed: usize,
    /// Rows newly inserted by the sink; duplicates are not counted
    pub persisted: usize,
}

impl UploadReport {
    /// Whether every row went through without an error
    pub fn is_clean(&self) -> bool {
        self.row_errors.is_empty() && self.chunk_failures.is_empty()
    }

    fn merge(&mut self, outcome: ChunkOutcome) {
        for (row, errors) in outcome.row_errors {
            self.row_errors.entry(row).or_default().extend(errors);
        }
        if let Some(failure) = outcome.failure {
            self.chunk_failures.push(failure);
        }
        self.parsed += outcome.parsed;
        self.persisted += outcome.persisted;
    }
}

/// Position of a chunk within the upload
#[derive(Debug, Clone, Copy)]
struct ChunkSpan {
    index: usize,
    first_row: u64,
    last_row: u64,
}

/// What one chunk task hands back to the aggregator
#[derive(Debug, Default)]
struct ChunkOutcome {
    row_errors: Vec<(u64, Vec<String>)>,
    failure: Option<ChunkFailure>,
    parsed: usize,
    persisted: usize,
}

impl ChunkOutcome {
    /// Mark the chunk failed and attach the failure to each of its rows
    fn fail(&mut self, span: ChunkSpan, reason: String) {
        let message = format!("failed to persist transaction: {reason}");
        for row in span.first_row..=span.last_row {
            self.row_errors.push((row, vec![message.clone()]));
        }
        self.failure = Some(ChunkFailure {
            chunk: span.index,
            first_row: span.first_row,
            last_row: span.last_row,
            reason,
        });
    }
}

/// Concurrent chunk processor
///
/// Cloning is cheap; clones share the sink.
#[derive(Debug)]
pub struct BatchProcessor<S> {
    sink: Arc<S>,
    config: BatchConfig,
}

impl<S> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            config: self.config,
        }
    }
}

impl<S: TransactionSink> BatchProcessor<S> {
    pub fn new(sink: Arc<S>, config: BatchConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> BatchConfig {
        self.config
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Split rows into chunks of at most `chunk_size` rows
    ///
    /// # Returns
    ///
    /// `(index of the chunk's first row, rows)` pairs in input order. No chunk
    /// is empty and every row lands in exactly one chunk.
    pub fn partition(&self, rows: Vec<Row>) -> Vec<(usize, Vec<Row>)> {
        let chunk_size = self.config.chunk_size.max(1);
        let mut chunks = Vec::with_capacity(rows.len().div_ceil(chunk_size));
        let mut start = 0;
        let mut rows = rows.into_iter().peekable();

        while rows.peek().is_some() {
            let chunk: Vec<Row> = rows.by_ref().take(chunk_size).collect();
            let len = chunk.len();
            chunks.push((start, chunk));
            start += len;
        }

        chunks
    }

    /// Parse and persist all rows, one task per chunk
    ///
    /// # Arguments
    ///
    /// * `rows` - data rows of the file, header excluded
    /// * `parser` - row parser selected for the bank
    /// * `columns` - resolved field → column assignment
    /// * `cancel` - raced against every chunk's persistence call
    ///
    /// # Returns
    ///
    /// The merged report of every chunk. Field errors and chunk failures are
    /// recorded in it; this method itself never fails.
    pub async fn process(
        &self,
        rows: Vec<Row>,
        parser: Arc<RowParser>,
        columns: Arc<FieldColumns>,
        cancel: CancellationToken,
    ) -> UploadReport {
        let semaphore = Arc::new(Semaphore::new(
            self.config.max_concurrent_chunks.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let row_occurrences = occurrences(&rows, &columns);

        let mut tasks = Vec::new();
        for (index, (start, rows)) in self.partition(rows).into_iter().enumerate() {
            let span = ChunkSpan {
                index,
                first_row: row_number(start),
                last_row: row_number(start + rows.len() - 1),
            };
            let chunk_occurrences = row_occurrences[start..start + rows.len()].to_vec();
            let sink = Arc::clone(&self.sink);
            let parser = Arc::clone(&parser);
            let columns = Arc::clone(&columns);
            let cancel = cancel.clone();
            let semaphore = Arc::clone(&semaphore);

            let task = tokio::spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                process_chunk(
                    sink.as_ref(),
                    &parser,
                    &columns,
                    &cancel,
                    span,
                    rows,
                    chunk_occurrences,
                )
                .await
            });
            tasks.push((span, task));
        }

        // Wait for every chunk and merge
        let mut report = UploadReport::default();
        for (span, task) in tasks {
            match task.await {
                Ok(outcome) => report.merge(outcome),
                Err(e) => {
                    error!(chunk = span.index, error = %e, "chunk task failed");
                    let mut outcome = ChunkOutcome::default();
                    outcome.fail(span, format!("chunk task failed: {e}"));
                    report.merge(outcome);
                }
            }
        }

        report
    }
}

async fn process_chunk<S: TransactionSink>(
    sink: &S,
    parser: &RowParser,
    columns: &FieldColumns,
    cancel: &CancellationToken,
    span: ChunkSpan,
    rows: Vec<Row>,
    occurrences: Vec<u32>,
) -> ChunkOutcome {
    let mut parsed = parser.parse_rows(&rows, columns);
    for (tx, occurrence) in parsed.transactions.iter_mut().zip(occurrences) {
        tx.occurrence = occurrence;
    }

    let mut outcome = ChunkOutcome {
        row_errors: parsed
            .errors
            .into_iter()
            .map(|(position, errors)| {
                (
                    span.first_row + position as u64,
                    errors.iter().map(ToString::to_string).collect(),
                )
            })
            .collect(),
        parsed: parsed.transactions.len(),
        ..ChunkOutcome::default()
    };

    if parsed.transactions.is_empty() {
        return outcome;
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = sink.save_transactions(parsed.transactions) => result,
    };

    match result {
        Ok(persisted) => {
            debug!(
                chunk = span.index,
                rows = outcome.parsed,
                persisted,
                "chunk persisted"
            );
            outcome.persisted = persisted;
        }
        Err(e) => {
            error!(
                chunk = span.index,
                first_row = span.first_row,
                last_row = span.last_row,
                error = %e,
                "failed to save transactions"
            );
            outcome.fail(span, e.to_string());
        }
    }

    outcome
}
