//! Error types for the ingestion pipeline
//!
//! Errors are split along the pipeline's recovery boundaries.
//!
//! # Error Categories
//!
//! - **Fatal upload errors** ([`UploadError`]): bad format, empty content,
//!   unsupported bank, missing required headers. They abort the upload before
//!   any row is parsed.
//! - **Field errors** ([`FieldError`]): one field of one row could not be
//!   parsed. They are attached to the row and never stop parsing.
//! - **Store errors** ([`StoreError`]): a collaborator call failed. During
//!   chunk persistence they are recovered into the row-error map.
//! - **Config errors** ([`ConfigError`]): the reference seed could not be loaded.

use thiserror::Error;

use super::bank::ImportMethod;
use super::transaction::{BankId, TransactionField};

/// Fatal error that rejects a whole upload
///
/// When one of these is returned no row has been parsed and nothing has been
/// persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    /// The content could not be decoded as delimited text
    #[error("invalid CSV format: {message}")]
    InvalidFormat {
        /// Description of the decoding failure
        message: String,
    },

    /// The content has no header row
    #[error("empty CSV content")]
    EmptyContent,

    /// A header marked as required by the bank's mapping is absent
    #[error("missing required header in CSV: {header}")]
    MissingRequiredHeader {
        /// Configured column name
        header: String,
    },

    /// No column of the file feeds a field every transaction needs
    #[error("no column mapped to required field '{field}'")]
    MissingRequiredField {
        /// The unmapped canonical field
        field: TransactionField,
    },

    /// The bank is not known to the registry
    #[error("unknown bank {bank_id}")]
    UnknownBank {
        /// Requested bank
        bank_id: BankId,
    },

    /// The bank does not accept this kind of import
    #[error("bank {bank_id} does not support {method} import")]
    UnsupportedImportMethod {
        /// Requested bank
        bank_id: BankId,
        /// Import method that was attempted
        method: ImportMethod,
    },

    /// A reference lookup needed before dispatch failed
    #[error("reference lookup failed: {0}")]
    Store(#[from] StoreError),

    /// The caller cancelled the upload before any chunk was dispatched
    #[error("upload cancelled")]
    Cancelled,
}

/// Field-level parse error attached to a single row
///
/// The Display text is what callers see in the row-error map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The cell feeding a field is blank
    #[error("empty {field} data")]
    EmptyValue {
        /// Field whose cell was blank
        field: TransactionField,
    },

    /// None of the accepted date layouts matched
    #[error("unknown date format: {value}")]
    InvalidDate {
        /// Raw cell content
        value: String,
    },

    /// The amount is not a decimal number
    #[error("invalid amount format: {value}")]
    InvalidAmount {
        /// Raw cell content
        value: String,
    },

    /// The row is shorter than a column index assigned to a field
    #[error("missing {field} column at index {index}")]
    MissingColumn {
        /// Field the column feeds
        field: TransactionField,
        /// Zero-based column index
        index: usize,
    },
}

/// Failure reported by a store collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested record does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record ("bank", "category", ...)
        entity: String,
        /// Requested identifier
        id: i64,
    },

    /// The store could not be reached
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the outage
        message: String,
    },

    /// The write violated a store constraint
    #[error("constraint violation: {message}")]
    Constraint {
        /// Description of the violation
        message: String,
    },

    /// The call observed the caller's cancellation signal
    #[error("operation cancelled")]
    Cancelled,
}

/// Failure while loading configuration or reference data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read '{path}': {message}")]
    Io {
        /// File that was read
        path: String,
        /// Underlying I/O error
        message: String,
    },

    /// The file content is not valid reference data
    #[error("failed to parse reference data: {message}")]
    Parse {
        /// Parser diagnostic
        message: String,
    },

    /// The reference data parsed but is inconsistent
    #[error("invalid reference data: {message}")]
    Invalid {
        /// Which record is wrong
        message: String,
    },
}

impl From<csv_async::Error> for UploadError {
    fn from(error: csv_async::Error) -> Self {
        UploadError::InvalidFormat {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl StoreError {
    /// Create a NotFound error
    pub fn not_found(entity: &str, id: i64) -> Self {
        StoreError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    /// Create a Constraint error
    pub fn constraint(message: impl Into<String>) -> Self {
        StoreError::Constraint {
            message: message.into(),
        }
    }
}

impl FieldError {
    /// Create an EmptyValue error
    pub fn empty(field: TransactionField) -> Self {
        FieldError::EmptyValue { field }
    }

    /// Create an InvalidDate error
    pub fn invalid_date(value: &str) -> Self {
        FieldError::InvalidDate {
            value: value.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(value: &str) -> Self {
        FieldError::InvalidAmount {
            value: value.to_string(),
        }
    }
}
