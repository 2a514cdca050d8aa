//! Core ingestion logic
//!
//! This module contains the pipeline components:
//! - `header_resolver` - Maps a file's header row to canonical fields
//! - `categorizer` - Keyword-based category inference
//! - `cache` - Snapshot caches for reference data
//! - `registry` - Cached read-through access to reference data
//! - `batch_processor` - Chunked, concurrent parsing and persistence
//! - `uploader` - Upload and feed import orchestration
//! - `traits` - Persistence and reference store seams
//! - `transaction_store` / `reference_store` - In-memory store implementations

pub mod batch_processor;
pub mod cache;
pub mod categorizer;
pub mod header_resolver;
pub mod reference_store;
pub mod registry;
pub mod traits;
pub mod transaction_store;
pub mod uploader;

pub use batch_processor::{BatchConfig, BatchProcessor, ChunkFailure, UploadReport};
pub use categorizer::KeywordIndex;
pub use header_resolver::{resolve_columns, FieldColumns};
pub use reference_store::InMemoryReferenceStore;
pub use registry::Registry;
pub use traits::{ReferenceStore, TransactionSink};
pub use transaction_store::InMemoryTransactionStore;
pub use uploader::UploadService;
