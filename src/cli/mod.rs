// CLI module
// Command-line interface, argument parsing and command execution

mod args;

pub use args::{CliArgs, Command, FeedArgs, UploadArgs};

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::core::{
    BatchProcessor, InMemoryReferenceStore, InMemoryTransactionStore, Registry, UploadService,
};
use crate::io::{load_reference_data, write_feed_skips_csv, write_row_errors_csv, ReferenceData};

/// Months of partitions created ahead at startup
pub const PRE_CREATED_PARTITIONS: u32 = 12;

type Service = UploadService<InMemoryReferenceStore, InMemoryTransactionStore>;

/// Parse command-line arguments using clap
///
/// On invalid arguments or `--help`, clap prints the message and exits.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Run the selected command, writing its CSV report to `output`
///
/// # Returns
///
/// * `Ok(())` if every input was processed; row errors alone do not fail a run
/// * `Err(String)` if the seed could not be loaded or any upload was rejected
pub async fn run(args: CliArgs, output: &mut dyn Write) -> Result<(), String> {
    let reference = match &args.seed {
        Some(path) => load_reference_data(path).map_err(|e| e.to_string())?,
        None => {
            warn!("no reference seed given, every bank will be unknown");
            ReferenceData::default()
        }
    };

    let registry = Arc::new(Registry::new(Arc::new(InMemoryReferenceStore::new(reference))));
    registry.initialize().await.map_err(|e| e.to_string())?;

    let store = Arc::new(InMemoryTransactionStore::new());
    let today = Utc::now().date_naive();
    if let Some(month_start) = today.with_day(1) {
        store
            .pre_create_partitions(month_start, PRE_CREATED_PARTITIONS)
            .map_err(|e| e.to_string())?;
    }

    match args.command {
        Command::Upload(upload) => {
            let processor = BatchProcessor::new(store, upload.to_batch_config());
            let service = UploadService::new(registry, processor);
            run_upload(&service, &upload, output).await
        }
        Command::ImportFeed(feed) => {
            let processor = BatchProcessor::new(store, Default::default());
            let service = UploadService::new(registry, processor);
            run_feed(&service, &feed, output).await
        }
    }
}

async fn run_upload(
    service: &Service,
    args: &UploadArgs,
    output: &mut dyn Write,
) -> Result<(), String> {
    let cancel = CancellationToken::new();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut rejected = 0;

    for path in &args.files {
        let content = read_input(path).await?;
        match service
            .upload(args.bank, args.user, &content, cancel.clone())
            .await
        {
            Ok(report) => reports.push((path.display().to_string(), report.row_errors)),
            Err(e) => {
                error!(file = %path.display(), error = %e, "file rejected");
                rejected += 1;
            }
        }
    }

    write_row_errors_csv(
        reports
            .iter()
            .map(|(source, row_errors)| (source.as_str(), row_errors)),
        output,
    )?;

    if rejected > 0 {
        return Err(format!("{} of {} files rejected", rejected, args.files.len()));
    }
    Ok(())
}

async fn run_feed(
    service: &Service,
    args: &FeedArgs,
    output: &mut dyn Write,
) -> Result<(), String> {
    let content = read_input(&args.file).await?;
    let report = service
        .import_feed(args.bank, args.user, &content, CancellationToken::new())
        .await
        .map_err(|e| format!("{}: {}", args.file.display(), e))?;

    write_feed_skips_csv(&report.skipped, output)
}

async fn read_input(path: &Path) -> Result<Vec<u8>, String> {
    tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}
