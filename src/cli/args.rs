use crate::core::BatchConfig;
use crate::types::{BankId, UserId};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Import bank statements and API feeds into categorized transactions
#[derive(Parser, Debug)]
#[command(name = "fin-aggregator")]
#[command(
    about = "Import bank statements and API feeds into categorized transactions",
    long_about = None
)]
pub struct CliArgs {
    /// TOML file with banks, categories, keywords and header mappings
    #[arg(
        long = "seed",
        value_name = "FILE",
        global = true,
        help = "Reference data seed (TOML)"
    )]
    pub seed: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload CSV statements; row errors are written to stdout as CSV
    Upload(UploadArgs),
    /// Import a banking API feed (JSON); skipped entries are written to stdout as CSV
    ImportFeed(FeedArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[arg(long = "bank", value_name = "ID")]
    pub bank: BankId,

    #[arg(long = "user", value_name = "ID")]
    pub user: UserId,

    /// Number of rows per chunk
    #[arg(
        long = "chunk-size",
        value_name = "SIZE",
        help = "Number of rows per chunk (default: 100)"
    )]
    pub chunk_size: Option<usize>,

    /// Maximum number of concurrent chunks
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of chunks processing concurrently (default: CPU cores)"
    )]
    pub max_concurrent_chunks: Option<usize>,

    /// CSV files exported by the bank
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    #[arg(long = "bank", value_name = "ID")]
    pub bank: BankId,

    #[arg(long = "user", value_name = "ID")]
    pub user: UserId,

    /// Saved API response body
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl UploadArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Options that were not given keep their default. Zero values fall back
    /// to the defaults with a logged warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.chunk_size.is_some() || self.max_concurrent_chunks.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.chunk_size.unwrap_or(default.chunk_size),
                self.max_concurrent_chunks
                    .unwrap_or(default.max_concurrent_chunks),
            )
        } else {
            BatchConfig::default()
        }
    }
}
