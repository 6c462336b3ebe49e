//! Domain types for Market Health

pub mod category;
pub mod check;
pub mod row;

pub use category::{Category, CategoryKey, CHECKS_PER_CATEGORY};
pub use check::Check;
pub use row::SectorRow;

/// Default sector universe (SPDR select sector ETFs).
pub const SECTORS_DEFAULT: [&str; 10] = [
    "XLC", "XLF", "XLI", "XLB", "XLRE", "XLU", "XLP", "XLY", "XLK", "XLE",
];

/// Benchmark used for relative strength, correlation and market trend.
pub const BENCHMARK_SYMBOL: &str = "SPY";

/// Volatility index used for the regime check.
pub const VOLATILITY_SYMBOL: &str = "^VIX";
