//! Bank parser strategies
//!
//! Each supported bank gets a parser strategy that turns one raw CSV row plus
//! the resolved field → column assignment into a canonical [`Transaction`]
//! and the list of field errors met along the way.
//!
//! # Design
//!
//! Strategies form a small closed set ([`ParserKind`]). Each one is a table of
//! field handlers ([`FieldHandlers`]) built by taking the base handlers and
//! overriding individual entries at construction time, plus an optional row
//! finalizer that runs once every field handler is done:
//!
//! ```text
//! Base     ── base::handlers()
//! Amex     ── base handlers, amount overridden, finalizer forces `outcome`
//! Revolut  ── base handlers, amount overridden
//! ```
//!
//! Parsing is best effort: a failing handler records its error and the row
//! keeps going, so every row yields a transaction with canonical defaults.

pub mod amex;
pub mod base;
pub mod revolut;

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::core::categorizer::KeywordIndex;
use crate::core::header_resolver::FieldColumns;
use crate::types::{
    Bank, BankId, BankName, CategoryId, FieldError, Transaction, TransactionField, UserId,
};

/// One decoded CSV row
pub type Row = Vec<String>;

/// Populates one field of a transaction from the trimmed cells assigned to it
pub type FieldHandler = fn(&ParseContext, &mut Transaction, &[&str]) -> Result<(), FieldError>;

/// Runs after all field handlers of a row
pub type RowFinalizer = fn(&ParseContext, &mut Transaction);

/// Everything a parser needs besides the row itself
///
/// Bank and user are injected into every transaction. The keyword index is the
/// snapshot taken when the upload started, so one upload is categorized
/// against one consistent keyword table.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub bank_id: BankId,
    pub user_id: UserId,
    pub keywords: Arc<KeywordIndex>,
    /// ID of the "Transfer" category, when the registry has one
    pub transfer_category: Option<CategoryId>,
}

impl ParseContext {
    pub fn new(bank_id: BankId, user_id: UserId, keywords: Arc<KeywordIndex>) -> Self {
        Self {
            bank_id,
            user_id,
            keywords,
            transfer_category: None,
        }
    }

    pub fn with_transfer_category(mut self, transfer_category: Option<CategoryId>) -> Self {
        self.transfer_category = transfer_category;
        self
    }
}

/// Handler table, one entry per canonical field
#[derive(Clone, Copy)]
pub struct FieldHandlers {
    pub date: FieldHandler,
    pub amount: FieldHandler,
    pub description: FieldHandler,
    pub category: FieldHandler,
    pub external_id: FieldHandler,
}

impl FieldHandlers {
    pub fn handler(&self, field: TransactionField) -> FieldHandler {
        match field {
            TransactionField::Date => self.date,
            TransactionField::Amount => self.amount,
            TransactionField::Description => self.description,
            TransactionField::Category => self.category,
            TransactionField::ExternalId => self.external_id,
        }
    }
}

impl fmt::Debug for FieldHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandlers").finish_non_exhaustive()
    }
}

/// The closed set of parser strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Generic parser, also used for unknown banks
    Base,
    /// Statement where every non-transfer line is a debit
    Amex,
    /// Any amount not starting with `-` is income
    Revolut,
}

impl ParserKind {
    /// Select the strategy for a well-known bank name
    pub fn for_bank(name: BankName) -> Self {
        match name {
            BankName::AmericanExpress => ParserKind::Amex,
            BankName::Revolut => ParserKind::Revolut,
            BankName::Unknown => ParserKind::Base,
        }
    }

    pub fn handlers(self) -> FieldHandlers {
        match self {
            ParserKind::Base => base::handlers(),
            ParserKind::Amex => amex::handlers(),
            ParserKind::Revolut => revolut::handlers(),
        }
    }

    /// Whether rows depend on the registry's "Transfer" category
    pub fn uses_transfer_category(self) -> bool {
        matches!(self, ParserKind::Amex)
    }

    pub fn finalizer(self) -> Option<RowFinalizer> {
        match self {
            ParserKind::Amex => Some(amex::finalize_type),
            ParserKind::Base | ParserKind::Revolut => None,
        }
    }
}

/// Result of parsing one row
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub transaction: Transaction,
    pub errors: Vec<FieldError>,
}

/// Result of parsing a slice of rows
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    /// One transaction per input row, in input order
    pub transactions: Vec<Transaction>,
    /// Zero-based position within the slice → errors of that row
    pub errors: Vec<(usize, Vec<FieldError>)>,
}

/// Row parser for one upload
#[derive(Debug, Clone)]
pub struct RowParser {
    kind: ParserKind,
    handlers: FieldHandlers,
    finalizer: Option<RowFinalizer>,
    context: ParseContext,
}

impl RowParser {
    pub fn new(kind: ParserKind, context: ParseContext) -> Self {
        Self {
            kind,
            handlers: kind.handlers(),
            finalizer: kind.finalizer(),
            context,
        }
    }

    pub fn kind(&self) -> ParserKind {
        self.kind
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    /// Parse one row
    ///
    /// Fields are visited in [`TransactionField`] order. Assigned columns past
    /// the end of the row are reported as `MissingColumn` and skipped; a
    /// handler still runs on whatever cells remain.
    pub fn parse_row(&self, row: &[String], columns: &FieldColumns) -> ParsedRow {
        let mut transaction = Transaction::new(self.context.bank_id, self.context.user_id);
        let mut errors = Vec::new();

        for (field, indices) in columns.iter() {
            let mut values = Vec::with_capacity(indices.len());
            for &index in indices {
                match row.get(index) {
                    Some(cell) => values.push(cell.trim()),
                    None => errors.push(FieldError::MissingColumn { field, index }),
                }
            }

            if values.is_empty() {
                continue;
            }

            let handler = self.handlers.handler(field);
            if let Err(e) = handler(&self.context, &mut transaction, &values) {
                errors.push(e);
            }
        }

        if let Some(finalize) = self.finalizer {
            finalize(&self.context, &mut transaction);
        }

        ParsedRow {
            transaction,
            errors,
        }
    }

    /// Parse a slice of rows, keeping every row's transaction
    pub fn parse_rows(&self, rows: &[Row], columns: &FieldColumns) -> ParsedRows {
        let mut parsed = ParsedRows {
            transactions: Vec::with_capacity(rows.len()),
            errors: Vec::new(),
        };

        for (position, row) in rows.iter().enumerate() {
            let ParsedRow {
                transaction,
                errors,
            } = self.parse_row(row, columns);
            if !errors.is_empty() {
                parsed.errors.push((position, errors));
            }
            parsed.transactions.push(transaction);
        }

        parsed
    }
}

/// Create the row parser for a bank
///
/// Banks without a dedicated strategy fall back to the base parser.
pub fn create_parser(bank: &Bank, context: ParseContext) -> RowParser {
    let name = bank.well_known_name();
    if name == BankName::Unknown {
        warn!(
            bank_id = bank.id,
            bank_name = %bank.name,
            "no dedicated parser for bank, using base parser"
        );
    }
    RowParser::new(ParserKind::for_bank(name), context)
}

/// First assigned cell of a field, rejecting blank cells
pub(crate) fn first_value<'a>(
    values: &[&'a str],
    field: TransactionField,
) -> Result<&'a str, FieldError> {
    match values.first() {
        Some(value) if !value.is_empty() => Ok(*value),
        _ => Err(FieldError::empty(field)),
    }
}
