//! Upload orchestration
//!
//! [`UploadService`] runs one upload end to end:
//!
//! ```text
//! decode → check bank → resolve headers → snapshot keywords → BatchProcessor → UploadReport
//! ```
//!
//! Every step before chunk dispatch is a precondition. If one fails the
//! upload is rejected with an [`UploadError`] and nothing is parsed or
//! persisted. Once chunks are dispatched the upload always completes with a
//! report, whatever individual rows or chunks do.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::batch_processor::{BatchProcessor, UploadReport};
use super::header_resolver::{resolve_columns, FieldColumns};
use super::registry::Registry;
use super::traits::{ReferenceStore, TransactionSink};
use crate::io::api_feed::{convert_feed, parse_feed, FeedReport};
use crate::io::async_reader::read_records;
use crate::strategy::{create_parser, ParseContext, ParserKind, Row, RowParser};
use crate::types::{
    Bank, BankId, CategoryId, ImportMethod, StoreError, UploadError, UserId,
    TRANSFER_CATEGORY_NAME,
};

/// Everything needed to dispatch chunks
struct PreparedUpload {
    rows: Vec<Row>,
    parser: RowParser,
    columns: FieldColumns,
}

/// Entry point for CSV uploads and API feed imports
#[derive(Debug)]
pub struct UploadService<R, S> {
    registry: Arc<Registry<R>>,
    processor: BatchProcessor<S>,
}

impl<R: ReferenceStore, S: TransactionSink> UploadService<R, S> {
    pub fn new(registry: Arc<Registry<R>>, processor: BatchProcessor<S>) -> Self {
        Self {
            registry,
            processor,
        }
    }

    pub fn registry(&self) -> &Arc<Registry<R>> {
        &self.registry
    }

    /// Import one CSV file for a bank and user
    ///
    /// # Arguments
    ///
    /// * `bank_id` - Bank the file was exported from
    /// * `user_id` - Owner of the transactions
    /// * `content` - Raw file content, header row first
    /// * `cancel` - Cancellation signal shared by every chunk
    ///
    /// # Returns
    ///
    /// * `Ok(UploadReport)` - rows were dispatched; the report lists row and
    ///   chunk errors (empty when everything succeeded)
    /// * `Err(UploadError)` - a precondition failed and no row was processed
    pub async fn upload(
        &self,
        bank_id: BankId,
        user_id: UserId,
        content: &[u8],
        cancel: CancellationToken,
    ) -> Result<UploadReport, UploadError> {
        let prepared = match self.prepare(bank_id, user_id, content, &cancel).await {
            Ok(prepared) => prepared,
            Err(e) => {
                error!(bank_id, user_id, error = %e, "upload rejected");
                return Err(e);
            }
        };

        info!(
            bank_id,
            user_id,
            rows = prepared.rows.len(),
            parser = ?prepared.parser.kind(),
            "upload accepted"
        );

        let report = self
            .processor
            .process(
                prepared.rows,
                Arc::new(prepared.parser),
                Arc::new(prepared.columns),
                cancel,
            )
            .await;

        info!(
            bank_id,
            user_id,
            parsed = report.parsed,
            persisted = report.persisted,
            rows_with_errors = report.row_errors.len(),
            failed_chunks = report.chunk_failures.len(),
            "upload finished"
        );

        Ok(report)
    }

    async fn prepare(
        &self,
        bank_id: BankId,
        user_id: UserId,
        content: &[u8],
        cancel: &CancellationToken,
    ) -> Result<PreparedUpload, UploadError> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let mut records = read_records(content).await?.into_iter();
        let header = records.next().ok_or(UploadError::EmptyContent)?;
        if header.iter().all(|cell| cell.trim().is_empty()) {
            return Err(UploadError::EmptyContent);
        }

        let bank = self.supported_bank(bank_id, ImportMethod::Csv).await?;

        let mappings = self.registry.header_mappings(bank_id).await?;
        let columns = resolve_columns(&header, &mappings)?;

        let mut context = self.parse_context(bank_id, user_id).await?;
        if ParserKind::for_bank(bank.well_known_name()).uses_transfer_category() {
            context = context.with_transfer_category(self.transfer_category().await?);
        }
        let parser = create_parser(&bank, context);

        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        Ok(PreparedUpload {
            rows: records.collect(),
            parser,
            columns,
        })
    }

    /// Import a banking API feed for a bank and user
    ///
    /// Entries with unusable dates are skipped and reported; the remaining
    /// ones are persisted in a single call, so a persistence failure fails the
    /// whole import.
    pub async fn import_feed(
        &self,
        bank_id: BankId,
        user_id: UserId,
        content: &[u8],
        cancel: CancellationToken,
    ) -> Result<FeedReport, UploadError> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let entries = parse_feed(content)?;
        self.supported_bank(bank_id, ImportMethod::Api).await?;
        let context = self.parse_context(bank_id, user_id).await?;
        let feed = convert_feed(entries, &context);

        let converted = feed.transactions.len();
        let persisted = if feed.transactions.is_empty() {
            0
        } else {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(StoreError::Cancelled),
                result = self.processor.sink().save_transactions(feed.transactions) => result,
            };
            result.map_err(|e| {
                error!(bank_id, user_id, error = %e, "failed to save feed transactions");
                UploadError::Store(e)
            })?
        };

        info!(
            bank_id,
            user_id,
            converted,
            persisted,
            skipped = feed.skipped.values().map(Vec::len).sum::<usize>(),
            "feed imported"
        );

        Ok(FeedReport {
            converted,
            persisted,
            skipped: feed.skipped,
        })
    }

    /// Look up a bank and check it accepts the import method
    async fn supported_bank(
        &self,
        bank_id: BankId,
        method: ImportMethod,
    ) -> Result<Bank, UploadError> {
        let bank = self.registry.bank(bank_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => UploadError::UnknownBank { bank_id },
            other => UploadError::Store(other),
        })?;

        if !bank.supports(method) {
            return Err(UploadError::UnsupportedImportMethod { bank_id, method });
        }
        Ok(bank)
    }

    /// Parse context with the current keyword snapshot
    async fn parse_context(
        &self,
        bank_id: BankId,
        user_id: UserId,
    ) -> Result<ParseContext, UploadError> {
        let keywords = self.registry.keyword_index().await?;
        Ok(ParseContext::new(bank_id, user_id, keywords))
    }

    async fn transfer_category(&self) -> Result<Option<CategoryId>, UploadError> {
        let transfer = self.registry.category_by_name(TRANSFER_CATEGORY_NAME).await?;
        Ok(transfer.map(|category| category.id))
    }
}
