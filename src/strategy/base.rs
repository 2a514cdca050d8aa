//! Base parser strategy
//!
//! The generic field handlers every strategy starts from. Unknown banks use
//! them unchanged.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use super::{first_value, FieldHandlers, ParseContext};
use crate::types::{FieldError, Transaction, TransactionField, TransactionType};

/// A date layout accepted in CSV exports
#[derive(Debug, Clone, Copy)]
pub enum DateLayout {
    /// Date and time of day
    DateTime(&'static str),
    /// Calendar date, interpreted as midnight
    Date(&'static str),
}

impl DateLayout {
    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        match self {
            DateLayout::DateTime(format) => NaiveDateTime::parse_from_str(value, format).ok(),
            DateLayout::Date(format) => NaiveDate::parse_from_str(value, format)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN)),
        }
    }
}

/// Accepted date layouts, tried in order; the first match wins
pub const DATE_LAYOUTS: [DateLayout; 5] = [
    DateLayout::DateTime("%Y-%m-%d %H:%M:%S"),
    DateLayout::Date("%d/%m/%Y"),
    DateLayout::Date("%Y-%m-%d"),
    DateLayout::Date("%d.%m.%Y"),
    DateLayout::Date("%Y/%m/%d"),
];

/// The base handler table
pub fn handlers() -> FieldHandlers {
    FieldHandlers {
        date: parse_date,
        amount: parse_amount,
        description: parse_description,
        category: parse_category,
        external_id: parse_external_id,
    }
}

/// Parse a date against [`DATE_LAYOUTS`]
pub fn parse_date_value(value: &str) -> Option<NaiveDateTime> {
    DATE_LAYOUTS.iter().find_map(|layout| layout.parse(value))
}

/// Parse a signed decimal amount
///
/// A leading `+` is accepted and dropped.
pub fn parse_decimal(value: &str) -> Result<Decimal, FieldError> {
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    Decimal::from_str(unsigned).map_err(|_| FieldError::invalid_amount(value))
}

pub fn parse_date(
    _context: &ParseContext,
    tx: &mut Transaction,
    values: &[&str],
) -> Result<(), FieldError> {
    let value = first_value(values, TransactionField::Date)?;
    let date = parse_date_value(value).ok_or_else(|| FieldError::invalid_date(value))?;
    tx.transaction_date = Some(date);
    Ok(())
}

/// Amount with the type taken from the sign: `-` outcome, `+` income,
/// anything else unspecified
///
/// The type is set before the number is validated, so it reflects the sign
/// even when the amount itself is rejected.
pub fn parse_amount(
    _context: &ParseContext,
    tx: &mut Transaction,
    values: &[&str],
) -> Result<(), FieldError> {
    let value = first_value(values, TransactionField::Amount)?;
    tx.tx_type = match value.chars().next() {
        Some('-') => TransactionType::Outcome,
        Some('+') => TransactionType::Income,
        _ => TransactionType::Unspecified,
    };
    tx.amount = Some(parse_decimal(value)?);
    Ok(())
}

/// All assigned description cells joined with `", "`
pub fn parse_description(
    _context: &ParseContext,
    tx: &mut Transaction,
    values: &[&str],
) -> Result<(), FieldError> {
    tx.description = values.join(", ");
    Ok(())
}

/// Category inferred from all assigned category cells
pub fn parse_category(
    context: &ParseContext,
    tx: &mut Transaction,
    values: &[&str],
) -> Result<(), FieldError> {
    tx.category_id = context.keywords.infer_from_parts(values);
    Ok(())
}

pub fn parse_external_id(
    _context: &ParseContext,
    tx: &mut Transaction,
    values: &[&str],
) -> Result<(), FieldError> {
    if let Some(value) = values.first() {
        tx.external_id = value.to_string();
    }
    Ok(())
}
