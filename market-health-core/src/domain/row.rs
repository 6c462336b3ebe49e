//! SectorRow: one symbol's full scoring result.

use super::category::{Category, CategoryKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores for one symbol across categories A–F.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRow {
    pub symbol: String,
    pub categories: BTreeMap<CategoryKey, Category>,
}

impl SectorRow {
    /// Highest total a row can reach (6 categories x 12).
    pub const MAX_TOTAL: u32 = Category::MAX_TOTAL * 6;

    /// Row for `symbol` with the given categories.
    pub fn new(symbol: impl Into<String>, categories: BTreeMap<CategoryKey, Category>) -> Self {
        Self {
            symbol: symbol.into(),
            categories,
        }
    }

    /// One category, if present.
    pub fn category(&self, key: CategoryKey) -> Option<&Category> {
        self.categories.get(&key)
    }

    /// Total for one category; a missing category counts as zero.
    pub fn category_total(&self, key: CategoryKey) -> u32 {
        self.category(key).map(Category::total).unwrap_or(0)
    }

    /// Sum over all six categories, `0..=72`.
    pub fn total(&self) -> u32 {
        CategoryKey::ALL
            .iter()
            .map(|k| self.category_total(*k))
            .sum()
    }

    /// Row total as a whole-number percentage of the maximum, in `0..=100`.
    ///
    /// This is the input to the rating classifier.
    pub fn percent(&self) -> u32 {
        ((f64::from(self.total()) / f64::from(Self::MAX_TOTAL)) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(score: u8) -> SectorRow {
        let categories = CategoryKey::ALL
            .iter()
            .map(|k| (*k, Category::uniform(*k, score)))
            .collect();
        SectorRow::new("XLK", categories)
    }

    #[test]
    fn totals_and_percent() {
        assert_eq!(row_with(2).total(), 72);
        assert_eq!(row_with(2).percent(), 100);
        assert_eq!(row_with(1).total(), 36);
        assert_eq!(row_with(1).percent(), 50);
        assert_eq!(row_with(0).percent(), 0);
    }

    #[test]
    fn missing_category_counts_zero() {
        let mut row = row_with(2);
        row.categories.remove(&CategoryKey::C);
        assert_eq!(row.category_total(CategoryKey::C), 0);
        assert_eq!(row.total(), 60);
    }

    #[test]
    fn payload_shape() {
        let value = serde_json::to_value(row_with(1)).unwrap();
        assert_eq!(value["symbol"], "XLK");
        assert_eq!(value["categories"]["A"]["checks"][0]["label"], "News");
        assert_eq!(value["categories"]["F"]["checks"].as_array().unwrap().len(), 6);
    }
}
