//! Cross-sectional rank by 5-bar return.
//!
//! Computed once per scoring pass over every requested symbol. Rank 1 is the
//! strongest. Symbols without a defined return rank last; ties break by
//! ascending symbol.

use crate::indicators::{last_defined, pct_change_over};
use std::collections::{HashMap, HashSet};

/// Rank per symbol, 1 for the strongest.
pub type SectorRanks = HashMap<String, usize>;

const RANK_LOOKBACK: usize = 5;

/// Last defined 5-bar return, or negative infinity.
pub fn five_bar_return(close: &[f64]) -> f64 {
    let r = last_defined(&pct_change_over(close, RANK_LOOKBACK));
    if r.is_nan() {
        f64::NEG_INFINITY
    } else {
        r
    }
}

/// Rank symbols by descending return. Later duplicates are ignored.
pub fn rank_by_return(returns: &[(String, f64)]) -> SectorRanks {
    let mut seen = HashSet::new();
    let mut sorted: Vec<(&str, f64)> = returns
        .iter()
        .filter(|(sym, _)| seen.insert(sym.as_str()))
        .map(|(sym, r)| (sym.as_str(), if r.is_nan() { f64::NEG_INFINITY } else { *r }))
        .collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, (sym, _))| (sym.to_string(), i + 1))
        .collect()
}

/// Rank symbols from their close series.
pub fn rank_sectors<'a, I>(closes: I) -> SectorRanks
where
    I: IntoIterator<Item = (&'a str, &'a [f64])>,
{
    let returns: Vec<(String, f64)> = closes
        .into_iter()
        .map(|(sym, close)| (sym.to_string(), five_bar_return(close)))
        .collect();
    rank_by_return(&returns)
}
