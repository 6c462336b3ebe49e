//! Seeded demo dataset for `rate --demo`.

use market_health_core::domain::{Category, CategoryKey, SectorRow, CHECKS_PER_CATEGORY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEMO_SEED: u64 = 42;

/// One row per symbol with uniformly random check scores. Same seed, same rows.
pub fn demo_rows(symbols: &[String], seed: u64) -> Vec<SectorRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    symbols
        .iter()
        .map(|symbol| {
            let categories = CategoryKey::ALL
                .iter()
                .map(|&key| {
                    let scores: [u8; CHECKS_PER_CATEGORY] =
                        std::array::from_fn(|_| rng.gen_range(0..=2));
                    (key, Category::from_scores(key, scores))
                })
                .collect();
            SectorRow::new(symbol.as_str(), categories)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Vec<String> {
        vec!["XLK".into(), "XLF".into(), "XLE".into()]
    }

    #[test]
    fn deterministic_for_seed() {
        assert_eq!(demo_rows(&symbols(), DEMO_SEED), demo_rows(&symbols(), DEMO_SEED));
    }

    #[test]
    fn rows_are_complete_and_bounded() {
        let rows = demo_rows(&symbols(), 7);
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.categories.len(), 6);
            assert!(row
                .categories
                .values()
                .all(|c| c.checks.len() == CHECKS_PER_CATEGORY && c.checks.iter().all(|ch| ch.score <= 2)));
        }
    }
}
