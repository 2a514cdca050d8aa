//! Bank-related types
//!
//! A bank's name selects which parser strategy handles its CSV exports, and
//! its import methods decide whether an upload is accepted at all.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::transaction::BankId;

/// How transactions of a bank can be brought into the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMethod {
    /// CSV statement upload
    Csv,
    /// Pulled from the bank's API
    Api,
    /// Anything the registry does not recognize
    #[serde(other)]
    Undefined,
}

impl fmt::Display for ImportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportMethod::Csv => "csv",
            ImportMethod::Api => "api",
            ImportMethod::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// A bank known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    #[serde(default)]
    pub import_methods: Vec<ImportMethod>,
}

impl Bank {
    /// Whether the bank accepts the given import method
    pub fn supports(&self, method: ImportMethod) -> bool {
        self.import_methods.contains(&method)
    }

    /// The well-known name used for parser selection
    pub fn well_known_name(&self) -> BankName {
        BankName::from_name(&self.name)
    }
}

/// Banks with a dedicated parser strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankName {
    AmericanExpress,
    Revolut,
    Unknown,
}

impl BankName {
    /// Match a registry bank name, ignoring ASCII case and surrounding whitespace
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("American express") {
            BankName::AmericanExpress
        } else if name.eq_ignore_ascii_case("Revolut") {
            BankName::Revolut
        } else {
            BankName::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::amex("American express", BankName::AmericanExpress)]
    #[case::amex_case("AMERICAN EXPRESS ", BankName::AmericanExpress)]
    #[case::revolut("Revolut", BankName::Revolut)]
    #[case::other("Monzo", BankName::Unknown)]
    #[case::empty("", BankName::Unknown)]
    fn test_bank_name_from_name(#[case] name: &str, #[case] expected: BankName) {
        assert_eq!(BankName::from_name(name), expected);
    }

    #[test]
    fn test_supports_import_method() {
        let bank = Bank {
            id: 1,
            name: "Revolut".to_string(),
            import_methods: vec![ImportMethod::Csv],
        };

        assert!(bank.supports(ImportMethod::Csv));
        assert!(!bank.supports(ImportMethod::Api));
    }
}
