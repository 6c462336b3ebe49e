//! Category scorers.
//!
//! Six independent scorers, one per category. Each is a pure function of the
//! symbol's history plus the shared market context, and returns an explicit
//! `CategoryOutcome`. `Insufficient` is not an error: it resolves to the
//! category's default checks so a symbol with no data still gets a full row.

pub mod catalyst;
pub mod environment;
pub mod execution;
pub mod flow;
pub mod rank;
pub mod risk;
pub mod trend;

pub use rank::{rank_by_return, rank_sectors, SectorRanks};

use crate::data::PriceHistory;
use crate::domain::{Category, CategoryKey, SectorRow, CHECKS_PER_CATEGORY};
use std::collections::BTreeMap;

/// Six check scores in label order.
pub type Scores = [u8; CHECKS_PER_CATEGORY];

/// Score assigned to an undefined measurement.
pub const NEUTRAL: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    Scored(Scores),
    /// Not enough data to score; the reason is for logging only.
    Insufficient(String),
}

impl CategoryOutcome {
    /// Insufficient data, with a reason for the log.
    pub fn insufficient(reason: impl Into<String>) -> Self {
        CategoryOutcome::Insufficient(reason.into())
    }

    /// Scores, or the category default when insufficient.
    pub fn scores(&self, key: CategoryKey) -> Scores {
        match self {
            CategoryOutcome::Scored(scores) => *scores,
            CategoryOutcome::Insufficient(_) => default_scores(key),
        }
    }

    /// The finished category, defaults applied.
    pub fn resolve(&self, key: CategoryKey) -> Category {
        Category::from_scores(key, self.scores(key))
    }
}

/// Checks used when a category cannot be scored.
pub fn default_scores(key: CategoryKey) -> Scores {
    match key {
        CategoryKey::B => [0; CHECKS_PER_CATEGORY],
        CategoryKey::E => [0, 0, 0, 0, 0, 1],
        CategoryKey::A | CategoryKey::C | CategoryKey::D | CategoryKey::F => {
            [NEUTRAL; CHECKS_PER_CATEGORY]
        }
    }
}

/// Apply a bucket rule to `x`, or return `NEUTRAL` if `x` is NaN or infinite.
pub(crate) fn bucket(x: f64, rule: impl FnOnce(f64) -> u8) -> u8 {
    if x.is_finite() {
        rule(x)
    } else {
        NEUTRAL
    }
}

/// Cross-symbol inputs shared by every row of a scoring pass.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub benchmark: &'a PriceHistory,
    pub volatility: &'a PriceHistory,
    pub ranks: &'a SectorRanks,
}

/// Run every scorer for one symbol and assemble its row.
pub fn score_symbol(symbol: &str, history: &PriceHistory, ctx: &MarketContext<'_>) -> SectorRow {
    let outcomes = [
        (CategoryKey::A, catalyst::score(history)),
        (CategoryKey::B, trend::score(history, &ctx.benchmark.close)),
        (CategoryKey::C, flow::score(history)),
        (CategoryKey::D, risk::score(history, ctx.benchmark)),
        (
            CategoryKey::E,
            environment::score(symbol, history, ctx.benchmark, ctx.volatility, ctx.ranks),
        ),
        (CategoryKey::F, execution::score()),
    ];

    let categories: BTreeMap<CategoryKey, Category> = outcomes
        .iter()
        .map(|(key, outcome)| {
            if let CategoryOutcome::Insufficient(reason) = outcome {
                log::debug!("{symbol} {key}: {reason}, using defaults");
            }
            (*key, outcome.resolve(*key))
        })
        .collect();

    SectorRow::new(symbol, categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_resolves_to_defaults() {
        let outcome = CategoryOutcome::insufficient("no data");
        assert_eq!(outcome.scores(CategoryKey::B), [0; 6]);
        assert_eq!(outcome.scores(CategoryKey::E), [0, 0, 0, 0, 0, 1]);
        assert_eq!(outcome.resolve(CategoryKey::D).total(), 6);
    }

    #[test]
    fn bucket_maps_undefined_to_neutral() {
        let rule = |x: f64| if x > 0.0 { 2 } else { 0 };
        assert_eq!(bucket(f64::NAN, rule), NEUTRAL);
        assert_eq!(bucket(f64::INFINITY, rule), NEUTRAL);
        assert_eq!(bucket(0.5, rule), 2);
        assert_eq!(bucket(-0.5, rule), 0);
    }

    #[test]
    fn empty_history_still_yields_full_row() {
        let empty = PriceHistory::default();
        let ranks = SectorRanks::new();
        let ctx = MarketContext {
            benchmark: &empty,
            volatility: &empty,
            ranks: &ranks,
        };
        let row = score_symbol("XLK", &empty, &ctx);
        assert_eq!(row.categories.len(), 6);
        // A 6 + B 0 + C 6 + D 6 + E 1 + F 6
        assert_eq!(row.total(), 25);
    }
}
