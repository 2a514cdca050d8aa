//! Header mapping resolution
//!
//! Translates the literal header row of an upload into the column indices
//! that feed each canonical transaction field, using the bank's configured
//! header mappings.
//!
//! Resolution is a fail-fast precondition of an upload: a missing required
//! header or an unmapped required field rejects the file before any data row
//! is parsed.

use std::collections::{BTreeMap, HashMap};

use crate::types::{HeaderMapping, TransactionField, UploadError};

/// Fields every transaction needs a column for
pub const REQUIRED_FIELDS: [TransactionField; 2] =
    [TransactionField::Date, TransactionField::Amount];

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Canonical field → column indices that supply it, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldColumns {
    columns: BTreeMap<TransactionField, Vec<usize>>,
}

impl FieldColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a column to a field
    pub fn push(&mut self, field: TransactionField, index: usize) {
        self.columns.entry(field).or_default().push(index);
    }

    /// Columns assigned to a field (empty when none)
    pub fn get(&self, field: TransactionField) -> &[usize] {
        self.columns.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: TransactionField) -> bool {
        !self.get(field).is_empty()
    }

    /// Iterate assignments in field handler order
    pub fn iter(&self) -> impl Iterator<Item = (TransactionField, &[usize])> {
        self.columns
            .iter()
            .map(|(field, indices)| (*field, indices.as_slice()))
    }
}

impl FromIterator<(TransactionField, usize)> for FieldColumns {
    fn from_iter<I: IntoIterator<Item = (TransactionField, usize)>>(iter: I) -> Self {
        let mut columns = FieldColumns::new();
        for (field, index) in iter {
            columns.push(field, index);
        }
        columns
    }
}

/// Resolve a header row against a bank's header mappings
///
/// Every observed column whose name matches a configured header is assigned,
/// in file order, to each field that header feeds. Configured headers absent
/// from the file are tolerated unless marked required.
///
/// # Arguments
///
/// * `headers` - The file's first row
/// * `mappings` - Header configuration of the uploading bank
///
/// # Errors
///
/// * `UploadError::MissingRequiredHeader` - a required configured header is absent
/// * `UploadError::MissingRequiredField` - no column feeds `date` or `amount`
pub fn resolve_columns<S: AsRef<str>>(
    headers: &[S],
    mappings: &[HeaderMapping],
) -> Result<FieldColumns, UploadError> {
    let configured: HashMap<&str, &HeaderMapping> = mappings
        .iter()
        .map(|mapping| (mapping.name.trim(), mapping))
        .collect();

    let mut columns = FieldColumns::new();
    let mut observed: Vec<&str> = Vec::with_capacity(headers.len());

    for (index, header) in headers.iter().enumerate() {
        let name = normalize_header(header.as_ref());
        observed.push(name);

        if let Some(mapping) = configured.get(name) {
            for field in &mapping.fields {
                columns.push(*field, index);
            }
        }
    }

    if let Some(missing) = mappings
        .iter()
        .find(|mapping| {
            let name = mapping.name.trim();
            mapping.required && !observed.iter().any(|observed| *observed == name)
        })
    {
        return Err(UploadError::MissingRequiredHeader {
            header: missing.name.clone(),
        });
    }

    if let Some(field) = REQUIRED_FIELDS
        .iter()
        .find(|field| !columns.contains(**field))
    {
        return Err(UploadError::MissingRequiredField { field: *field });
    }

    Ok(columns)
}

fn normalize_header(header: &str) -> &str {
    header.trim_start_matches(BYTE_ORDER_MARK).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mapping(name: &str, required: bool, fields: &[TransactionField]) -> HeaderMapping {
        HeaderMapping {
            bank_id: 1,
            name: name.to_string(),
            required,
            fields: fields.to_vec(),
        }
    }

    fn standard_mappings() -> Vec<HeaderMapping> {
        vec![
            mapping("Date", true, &[TransactionField::Date]),
            mapping("Amount", true, &[TransactionField::Amount]),
            mapping(
                "Description",
                false,
                &[TransactionField::Description, TransactionField::Category],
            ),
            mapping("Reference", false, &[TransactionField::ExternalId]),
        ]
    }

    #[test]
    fn test_resolves_columns_by_name() {
        let headers = ["Date", "Amount", "Description"];
        let columns = resolve_columns(&headers, &standard_mappings()).unwrap();

        assert_eq!(columns.get(TransactionField::Date), &[0]);
        assert_eq!(columns.get(TransactionField::Amount), &[1]);
        assert_eq!(columns.get(TransactionField::Description), &[2]);
        assert_eq!(columns.get(TransactionField::Category), &[2]);
        assert!(!columns.contains(TransactionField::ExternalId));
    }

    #[test]
    fn test_column_order_follows_file() {
        let mappings = vec![
            mapping("Date", false, &[TransactionField::Date]),
            mapping("Amount", false, &[TransactionField::Amount]),
            mapping("Merchant", false, &[TransactionField::Description]),
            mapping("Memo", false, &[TransactionField::Description]),
        ];
        let headers = ["Memo", "Date", "Merchant", "Amount"];
        let columns = resolve_columns(&headers, &mappings).unwrap();

        assert_eq!(columns.get(TransactionField::Description), &[0, 2]);
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let headers = ["Balance", "Date", "Amount", "Currency"];
        let columns = resolve_columns(&headers, &standard_mappings()).unwrap();

        assert_eq!(columns.get(TransactionField::Date), &[1]);
        assert_eq!(columns.get(TransactionField::Amount), &[2]);
    }

    #[test]
    fn test_header_whitespace_and_bom_are_ignored() {
        let headers = ["\u{feff}Date", " Amount "];
        let columns = resolve_columns(&headers, &standard_mappings()).unwrap();

        assert_eq!(columns.get(TransactionField::Date), &[0]);
        assert_eq!(columns.get(TransactionField::Amount), &[1]);
    }

    #[test]
    fn test_missing_required_header_is_fatal() {
        let headers = ["Amount", "Description"];
        let result = resolve_columns(&headers, &standard_mappings());

        assert_eq!(
            result,
            Err(UploadError::MissingRequiredHeader {
                header: "Date".to_string()
            })
        );
    }

    #[rstest]
    #[case::no_date(&["Amount"], TransactionField::Date)]
    #[case::no_amount(&["Date"], TransactionField::Amount)]
    fn test_missing_required_field_is_fatal(
        #[case] headers: &[&str],
        #[case] expected: TransactionField,
    ) {
        // Nothing marked required, so only the field check can reject.
        let mappings = vec![
            mapping("Date", false, &[TransactionField::Date]),
            mapping("Amount", false, &[TransactionField::Amount]),
        ];
        let result = resolve_columns(headers, &mappings);

        assert_eq!(
            result,
            Err(UploadError::MissingRequiredField { field: expected })
        );
    }

    #[test]
    fn test_no_mappings_rejects_upload() {
        let headers = ["Date", "Amount"];
        let result = resolve_columns(&headers, &[]);

        assert!(matches!(
            result,
            Err(UploadError::MissingRequiredField { .. })
        ));
    }
}
