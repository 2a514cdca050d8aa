//! Keyword-based category inference
//!
//! Maps free text (a category label, a description, or both) to a category
//! by case-insensitive substring containment against the keyword table.
//!
//! # Matching order
//!
//! Overlapping keywords are resolved deterministically: the longest keyword
//! wins, and keywords of equal length are tried in lexicographic order. The
//! order is fixed when the index is built, so every lookup against the same
//! snapshot gives the same answer.

use crate::types::{CategoryId, Keyword, UNCATEGORIZED_ID};

/// Immutable, pre-sorted keyword table
///
/// Built once per cache reload and shared behind an `Arc` by every parser
/// that reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordIndex {
    /// Lowercased keyword and its category, in matching order
    entries: Vec<(String, CategoryId)>,
}

impl KeywordIndex {
    /// Build an index from keyword records
    ///
    /// Blank keywords are dropped since they would match every text. When the
    /// same keyword is mapped to several categories the lowest category ID is
    /// kept.
    pub fn new<I>(keywords: I) -> Self
    where
        I: IntoIterator<Item = Keyword>,
    {
        let mut entries: Vec<(String, CategoryId)> = keywords
            .into_iter()
            .map(|keyword| (keyword.name.trim().to_lowercase(), keyword.category_id))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        entries.sort_by(|(a, a_id), (b, b_id)| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.cmp(b))
                .then_with(|| a_id.cmp(b_id))
        });
        entries.dedup_by(|later, earlier| later.0 == earlier.0);

        Self { entries }
    }

    /// Find the category of the first matching keyword, if any
    pub fn find(&self, text: &str) -> Option<CategoryId> {
        let text = text.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, category_id)| *category_id)
    }

    /// Infer a category, falling back to the uncategorized sentinel
    ///
    /// Never fails: an empty index or no match is a normal outcome.
    pub fn infer(&self, text: &str) -> CategoryId {
        self.find(text).unwrap_or(UNCATEGORIZED_ID)
    }

    /// Infer a category from several text fragments joined by a space
    pub fn infer_from_parts(&self, parts: &[&str]) -> CategoryId {
        self.infer(&parts.join(" "))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
