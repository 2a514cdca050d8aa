//! American Express parser strategy
//!
//! Amex statements list debits as plain amounts, so the sign says nothing
//! about direction. Instead every row whose inferred category is not the
//! "Transfer" category is forced to `outcome` once all fields are parsed.

use super::base::{self, parse_decimal};
use super::{first_value, FieldHandlers, ParseContext};
use crate::types::{FieldError, Transaction, TransactionField, TransactionType};

pub fn handlers() -> FieldHandlers {
    FieldHandlers {
        amount: parse_amount,
        ..base::handlers()
    }
}

/// Amount without any type inference
pub fn parse_amount(
    _context: &ParseContext,
    tx: &mut Transaction,
    values: &[&str],
) -> Result<(), FieldError> {
    let value = first_value(values, TransactionField::Amount)?;
    tx.amount = Some(parse_decimal(value)?);
    Ok(())
}

/// Force `outcome` unless the row was categorized as a transfer
pub fn finalize_type(context: &ParseContext, tx: &mut Transaction) {
    if context.transfer_category != Some(tx.category_id) {
        tx.tx_type = TransactionType::Outcome;
    }
}
