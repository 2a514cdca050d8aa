//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: canonical transaction shape and identifiers
//! - `bank`: banks, import methods and parser-selecting names
//! - `category`: categories, keywords and the well-known category constants
//! - `header`: per-bank header mapping configuration
//! - `error`: error types for the pipeline

pub mod bank;
pub mod category;
pub mod error;
pub mod header;
pub mod transaction;

pub use bank::{Bank, BankName, ImportMethod};
pub use category::{Category, CategoryId, Keyword, TRANSFER_CATEGORY_NAME, UNCATEGORIZED_ID};
pub use error::{ConfigError, FieldError, StoreError, UploadError};
pub use header::HeaderMapping;
pub use transaction::{BankId, Transaction, TransactionField, TransactionType, UserId};
