//! Reference data seed files
//!
//! Banks, categories, keywords and header mappings are loaded from a TOML
//! file into the in-memory reference store:
//!
//! ```toml
//! [[banks]]
//! id = 1
//! name = "American express"
//! import_methods = ["csv"]
//!
//! [[categories]]
//! id = 9
//! name = "Transfer"
//!
//! [[keywords]]
//! category_id = 9
//! name = "payment received"
//!
//! [[header_mappings]]
//! bank_id = 1
//! name = "Date"
//! required = true
//! fields = ["date"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::types::{Bank, Category, ConfigError, HeaderMapping, Keyword};

/// Contents of the reference tables
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub banks: Vec<Bank>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub header_mappings: Vec<HeaderMapping>,
}

impl ReferenceData {
    /// Check the cross references between tables
    ///
    /// IDs must be unique per table, and keywords and header mappings must
    /// point at a category or bank that exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut bank_ids = HashSet::new();
        for bank in &self.banks {
            if !bank_ids.insert(bank.id) {
                return Err(invalid(format!("duplicate bank id {}", bank.id)));
            }
        }

        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id) {
                return Err(invalid(format!("duplicate category id {}", category.id)));
            }
        }

        if let Some(keyword) = self
            .keywords
            .iter()
            .find(|keyword| !category_ids.contains(&keyword.category_id))
        {
            return Err(invalid(format!(
                "keyword '{}' refers to unknown category {}",
                keyword.name, keyword.category_id
            )));
        }

        if let Some(mapping) = self
            .header_mappings
            .iter()
            .find(|mapping| !bank_ids.contains(&mapping.bank_id))
        {
            return Err(invalid(format!(
                "header '{}' refers to unknown bank {}",
                mapping.name, mapping.bank_id
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid { message }
}

/// Parse and validate a TOML seed
pub fn parse_reference_data(content: &str) -> Result<ReferenceData, ConfigError> {
    let data: ReferenceData = toml::from_str(content)?;
    data.validate()?;
    Ok(data)
}

/// Read, parse and validate a TOML seed file
pub fn load_reference_data(path: &Path) -> Result<ReferenceData, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_reference_data(&content)
}
