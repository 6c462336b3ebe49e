//! Category: a fixed group of six checks.

use super::check::Check;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of checks in every category.
pub const CHECKS_PER_CATEGORY: usize = 6;

/// Category keys A–F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryKey {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 6] = [
        CategoryKey::A,
        CategoryKey::B,
        CategoryKey::C,
        CategoryKey::D,
        CategoryKey::E,
        CategoryKey::F,
    ];

    /// Human-readable category name.
    pub fn name(self) -> &'static str {
        match self {
            CategoryKey::A => "Catalyst Health",
            CategoryKey::B => "Trend & Structure",
            CategoryKey::C => "Position & Flow",
            CategoryKey::D => "Risk & Volatility",
            CategoryKey::E => "Environment & Regime",
            CategoryKey::F => "Execution & Frictions",
        }
    }

    /// Fixed check labels, in output order.
    pub fn labels(self) -> [&'static str; CHECKS_PER_CATEGORY] {
        match self {
            CategoryKey::A => ["News", "Analysts", "Event", "Insiders", "Peers/Macro", "Guidance"],
            CategoryKey::B => ["Stacked MAs", "RS vs SPY", "BB Mid", "20D Break", "Vol x", "Hold 20EMA"],
            CategoryKey::C => ["EM Fit", "OI/Flow", "Blocks/DP", "Leaders%>20D", "Money Flow", "SI/Days"],
            CategoryKey::D => ["ATR%", "IV%", "Correlation", "Event Risk", "Gap Plan", "Sizing/RR"],
            CategoryKey::E => ["SPY Trend", "Sector Rank", "Breadth", "VIX Regime", "3-Day RS", "Drivers"],
            CategoryKey::F => ["Trigger", "Invalidation", "Targets", "Time Stop", "Slippage", "Alerts"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKey::A => "A",
            CategoryKey::B => "B",
            CategoryKey::C => "C",
            CategoryKey::D => "D",
            CategoryKey::E => "E",
            CategoryKey::F => "F",
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Six checks under one category key.
///
/// Serializes as `{"checks": [...]}`; the key lives in the parent map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub checks: Vec<Check>,
}

impl Category {
    /// Highest total a category can reach.
    pub const MAX_TOTAL: u32 = Check::MAX_SCORE as u32 * CHECKS_PER_CATEGORY as u32;

    /// Zip the category's fixed labels with six scores.
    pub fn from_scores(key: CategoryKey, scores: [u8; CHECKS_PER_CATEGORY]) -> Self {
        let checks = key
            .labels()
            .iter()
            .zip(scores)
            .map(|(label, score)| Check::new(*label, score))
            .collect();
        Self { checks }
    }

    /// All six checks at the same score.
    pub fn uniform(key: CategoryKey, score: u8) -> Self {
        Self::from_scores(key, [score; CHECKS_PER_CATEGORY])
    }

    /// Sum of check scores, `0..=12`.
    pub fn total(&self) -> u32 {
        self.checks.iter().map(|c| u32::from(c.score)).sum()
    }

    /// Raw check scores in order.
    pub fn scores(&self) -> Vec<u8> {
        self.checks.iter().map(|c| c.score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_key() {
        let cat = Category::from_scores(CategoryKey::B, [2, 1, 0, 0, 1, 2]);
        assert_eq!(cat.checks[0].label, "Stacked MAs");
        assert_eq!(cat.checks[5].label, "Hold 20EMA");
        assert_eq!(cat.total(), 6);
    }

    #[test]
    fn max_total_is_twelve() {
        assert_eq!(Category::MAX_TOTAL, 12);
        assert_eq!(Category::uniform(CategoryKey::F, 2).total(), 12);
    }

    #[test]
    fn key_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&CategoryKey::E).unwrap(), "\"E\"");
    }
}
