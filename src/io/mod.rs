//! I/O module
//!
//! Handles decoding of uploads and feeds, reference seeds, and report output.
//!
//! # Components
//!
//! - `async_reader` - Asynchronous CSV decoding into raw rows
//! - `csv_format` - CSV output of row errors and skipped feed entries
//! - `reference_seed` - TOML reference data loading
//! - `api_feed` - Banking API feed conversion

pub mod api_feed;
pub mod async_reader;
pub mod csv_format;
pub mod reference_seed;

pub use api_feed::{convert_feed, parse_feed, ConvertedFeed, FeedReport, FeedTransaction};
pub use async_reader::{read_records, RecordReader};
pub use csv_format::{write_feed_skips_csv, write_row_errors_csv};
pub use reference_seed::{load_reference_data, parse_reference_data, ReferenceData};
