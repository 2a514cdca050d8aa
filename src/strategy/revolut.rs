//! Revolut parser strategy
//!
//! Revolut exports only sign outgoing amounts: a leading `-` is `outcome`,
//! any other leading character is `income`.

use super::base::{self, parse_decimal};
use super::{first_value, FieldHandlers, ParseContext};
use crate::types::{FieldError, Transaction, TransactionField, TransactionType};

pub fn handlers() -> FieldHandlers {
    FieldHandlers {
        amount: parse_amount,
        ..base::handlers()
    }
}

pub fn parse_amount(
    _context: &ParseContext,
    tx: &mut Transaction,
    values: &[&str],
) -> Result<(), FieldError> {
    let value = first_value(values, TransactionField::Amount)?;
    tx.tx_type = if value.starts_with('-') {
        TransactionType::Outcome
    } else {
        TransactionType::Income
    };
    tx.amount = Some(parse_decimal(value)?);
    Ok(())
}
