//! Financial aggregator CLI
//!
//! Imports bank CSV statements and API feeds into categorized transactions.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --seed reference.toml upload --bank 1 --user 7 march.csv april.csv > errors.csv
//! cargo run -- --seed reference.toml upload --bank 1 --user 7 --chunk-size 50 --max-concurrent 4 march.csv
//! cargo run -- --seed reference.toml import-feed --bank 3 --user 7 feed.json > skipped.csv
//! ```
//!
//! Reports go to stdout as CSV; logs go to stderr and are filtered with
//! `RUST_LOG` (default `info`).
//!
//! # Exit Codes
//!
//! - 0: Success (row-level errors are reported, not fatal)
//! - 1: Error (bad seed, unreadable file, rejected upload, etc.)

use fin_aggregator::cli;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            process::exit(1);
        }
    };

    let mut output = std::io::stdout();
    if let Err(e) = runtime.block_on(cli::run(args, &mut output)) {
        error!("{}", e);
        process::exit(1);
    }
}
