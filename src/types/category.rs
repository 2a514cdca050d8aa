//! Category and keyword types

use serde::{Deserialize, Serialize};

/// Category identifier
pub type CategoryId = i64;

/// Category assigned when no keyword matches
pub const UNCATEGORIZED_ID: CategoryId = 1;

/// Name of the category that exempts Amex rows from being forced to `outcome`
pub const TRANSFER_CATEGORY_NAME: &str = "Transfer";

/// Spending category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Text fragment that maps free text to a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub category_id: CategoryId,
    pub name: String,
}
