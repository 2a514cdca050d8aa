//! Financial aggregator library
//! # Overview
//!
//! This library ingests bank CSV statements (and API transaction feeds) into a
//! canonical, categorized transaction store. Uploads are processed in
//! concurrent chunks; rows that fail to parse are reported by their line in
//! the uploaded file instead of failing the upload.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, Bank, Category, errors)
//! - [`cli`] - CLI arguments parsing and command execution
//! - [`core`] - Pipeline components:
//!   - [`core::header_resolver`] - Header row → canonical field columns
//!   - [`core::categorizer`] - Keyword-based category inference
//!   - [`core::registry`] - Cached reference data
//!   - [`core::batch_processor`] - Chunked concurrent parsing and persistence
//!   - [`core::uploader`] - Upload orchestration
//! - [`strategy`] - Per-bank row parsers
//! - [`io`] - CSV decoding, report output, seeds and API feeds
//!
//! # Upload flow
//!
//! ```text
//! bytes ─► decode ─► header check ─► chunks ─► parse ─► persist ─► row-error report
//! ```
//!
//! Precondition failures (bad format, empty file, unknown or unsupported
//! bank, missing required headers) reject the upload before any row is
//! processed. After that, field errors stay with their row and a failing
//! chunk never stops the others.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use crate::core::{
    BatchConfig, BatchProcessor, InMemoryReferenceStore, InMemoryTransactionStore, Registry,
    UploadReport, UploadService,
};
pub use crate::io::{write_row_errors_csv, ReferenceData};
pub use crate::types::{
    Bank, BankId, Category, CategoryId, FieldError, Transaction, TransactionType, UploadError,
    UserId,
};
