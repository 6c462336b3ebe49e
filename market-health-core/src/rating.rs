//! Rating bands for aggregate scores.
//!
//! A 0–100 score falls into one of five bands split by four cut-points.
//! Cut-points are fixed (20/40/60/80), quantiles of the current
//! cross-section, or quantiles clamped to within `guard` of the fixed ones.
//!
//! `BandState` adds hysteresis across repeated evaluations: a symbol only
//! leaves its committed band once the score clears the boundary by `h`
//! points, which keeps labels from flickering in watch mode.

use crate::config::{ConfigError, RatingConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Top of the score scale.
pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingScheme {
    Fixed,
    Quantile,
    #[default]
    Hybrid,
}

impl RatingScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingScheme::Fixed => "fixed",
            RatingScheme::Quantile => "quantile",
            RatingScheme::Hybrid => "hybrid",
        }
    }
}

impl FromStr for RatingScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(RatingScheme::Fixed),
            "quantile" => Ok(RatingScheme::Quantile),
            "hybrid" => Ok(RatingScheme::Hybrid),
            _ => Err(ConfigError::UnknownScheme(s.to_string())),
        }
    }
}

impl fmt::Display for RatingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five ordinal bands, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl Band {
    pub const ALL: [Band; 5] = [
        Band::StrongSell,
        Band::Sell,
        Band::Hold,
        Band::Buy,
        Band::StrongBuy,
    ];

    /// Position in `Band::ALL`, weakest first.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display label, e.g. "Strong Buy".
    pub fn label(self) -> &'static str {
        match self {
            Band::StrongSell => "Strong Sell",
            Band::Sell => "Sell",
            Band::Hold => "Hold",
            Band::Buy => "Buy",
            Band::StrongBuy => "Strong Buy",
        }
    }

    /// Tile abbreviation: SS, S, H, B or SB.
    pub fn short(self) -> &'static str {
        match self {
            Band::StrongSell => "SS",
            Band::Sell => "S",
            Band::Hold => "H",
            Band::Buy => "B",
            Band::StrongBuy => "SB",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Four non-decreasing cut-points `c1 <= c2 <= c3 <= c4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBounds(pub [u32; 4]);

impl RatingBounds {
    pub const FIXED: RatingBounds = RatingBounds([20, 40, 60, 80]);

    /// The four ascending cut-points.
    pub fn cuts(&self) -> [u32; 4] {
        self.0
    }

    /// Left-closed intervals: `[0,c1)`, `[c1,c2)`, `[c2,c3)`, `[c3,c4)`, `[c4,100]`.
    pub fn classify(&self, score: u32) -> Band {
        let i = self.0.iter().take_while(|&&cut| score >= cut).count();
        Band::ALL[i]
    }

    /// Lowest score in `band`.
    pub fn lower_of(&self, band: Band) -> u32 {
        match band.index() {
            0 => 0,
            i => self.0[i - 1],
        }
    }

    /// Highest score in `band`.
    pub fn upper_of(&self, band: Band) -> u32 {
        match self.0.get(band.index()) {
            Some(cut) => cut.saturating_sub(1),
            None => MAX_SCORE,
        }
    }

    /// `band` with the inclusive score range these bounds give it.
    pub fn rating_for(&self, band: Band) -> Rating {
        Rating {
            band,
            lo: self.lower_of(band),
            hi: self.upper_of(band),
        }
    }

    /// Classify `score` and attach its range.
    pub fn rating(&self, score: u32) -> Rating {
        self.rating_for(self.classify(score))
    }
}

impl Default for RatingBounds {
    fn default() -> Self {
        Self::FIXED
    }
}

/// A band plus its inclusive score range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub band: Band,
    pub lo: u32,
    pub hi: u32,
}

impl Rating {
    pub fn label(&self) -> &'static str {
        self.band.label()
    }

    pub fn short(&self) -> &'static str {
        self.band.short()
    }
}

/// Nearest-rank quantiles of `scores`. Empty input falls back to the fixed bounds.
///
/// The rank for percentile `p` is `round_half_even(p/100 * (n-1))`, clamped to the data.
pub fn quantile_bounds(scores: &[u32], quantiles: &[f64; 4]) -> RatingBounds {
    let mut xs = scores.to_vec();
    if xs.is_empty() {
        return RatingBounds::FIXED;
    }
    xs.sort_unstable();
    let last = xs.len() - 1;
    let pick = |p: f64| {
        let k = (p / 100.0 * last as f64).round_ties_even();
        let k = if k.is_nan() { 0.0 } else { k.clamp(0.0, last as f64) };
        xs[k as usize]
    };
    RatingBounds(quantiles.map(pick))
}

/// Cut-points for `scheme`.
pub fn bounds(
    scores: &[u32],
    scheme: RatingScheme,
    quantiles: &[f64; 4],
    guard: u32,
) -> RatingBounds {
    match scheme {
        RatingScheme::Fixed => RatingBounds::FIXED,
        RatingScheme::Quantile => quantile_bounds(scores, quantiles),
        RatingScheme::Hybrid => {
            let q = quantile_bounds(scores, quantiles).0;
            let f = RatingBounds::FIXED.0;
            RatingBounds(std::array::from_fn(|i| {
                q[i].clamp(f[i].saturating_sub(guard), f[i].saturating_add(guard))
            }))
        }
    }
}

/// Last committed band per symbol.
#[derive(Debug, Clone, Default)]
pub struct BandState {
    committed: HashMap<String, Band>,
}

impl BandState {
    /// No symbol committed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed band for `symbol`.
    pub fn get(&self, symbol: &str) -> Option<Band> {
        self.committed.get(symbol).copied()
    }

    /// Symbols with a committed band.
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Forget every committed band.
    pub fn clear(&mut self) {
        self.committed.clear();
    }

    /// Classify `score` and commit the result, applying hysteresis against the previous band.
    ///
    /// Moving up needs `score >= lower(new band) + h`. Moving down needs
    /// `score < lower(current band) - h`. The committed band is recorded even
    /// when hysteresis is off.
    pub fn commit(
        &mut self,
        symbol: &str,
        score: u32,
        bounds: &RatingBounds,
        hysteresis: u32,
    ) -> Band {
        let raw = bounds.classify(score);
        let band = match self.get(symbol) {
            Some(prev) if hysteresis > 0 => {
                let score = i64::from(score);
                let h = i64::from(hysteresis);
                if raw > prev && score >= i64::from(bounds.lower_of(raw)) + h {
                    raw
                } else if raw < prev && score < i64::from(bounds.lower_of(prev)) - h {
                    raw
                } else {
                    prev
                }
            }
            _ => raw,
        };
        self.committed.insert(symbol.to_string(), band);
        band
    }
}

/// One symbol's rated score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatedSymbol {
    pub symbol: String,
    pub score: u32,
    pub rating: Rating,
}

/// Rate a cross-section: derive bounds from all scores, then commit each symbol in order.
pub fn rate(
    scores: &[(String, u32)],
    config: &RatingConfig,
    state: &mut BandState,
) -> (RatingBounds, Vec<RatedSymbol>) {
    let values: Vec<u32> = scores.iter().map(|(_, s)| *s).collect();
    let cuts = bounds(&values, config.scheme, &config.quantiles, config.guard);
    let rated = scores
        .iter()
        .map(|(symbol, score)| {
            let band = state.commit(symbol, *score, &cuts, config.hysteresis);
            RatedSymbol {
                symbol: symbol.clone(),
                score: *score,
                rating: cuts.rating_for(band),
            }
        })
        .collect();
    (cuts, rated)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QS: [f64; 4] = [10.0, 30.0, 70.0, 90.0];

    #[test]
    fn fixed_ignores_scores() {
        assert_eq!(
            bounds(&[1, 2, 3], RatingScheme::Fixed, &QS, 5),
            RatingBounds([20, 40, 60, 80])
        );
        assert_eq!(bounds(&[], RatingScheme::Fixed, &QS, 5), RatingBounds::FIXED);
    }

    #[test]
    fn classify_is_left_closed() {
        let b = RatingBounds::FIXED;
        assert_eq!(b.classify(0), Band::StrongSell);
        assert_eq!(b.classify(19), Band::StrongSell);
        assert_eq!(b.classify(20), Band::Sell);
        assert_eq!(b.classify(59), Band::Hold);
        assert_eq!(b.classify(80), Band::StrongBuy);
        assert_eq!(b.classify(100), Band::StrongBuy);
    }

    #[test]
    fn rating_ranges() {
        let b = RatingBounds::FIXED;
        let r = b.rating(45);
        assert_eq!((r.label(), r.short(), r.lo, r.hi), ("Hold", "H", 40, 59));
        let top = b.rating(95);
        assert_eq!((top.short(), top.lo, top.hi), ("SB", 80, 100));
        let bottom = b.rating(3);
        assert_eq!((bottom.short(), bottom.lo, bottom.hi), ("SS", 0, 19));
    }

    #[test]
    fn quantile_nearest_rank_rounds_half_even() {
        // n = 11, ranks: 1.0 -> 1, 3.0 -> 3, 7.0 -> 7, 9.0 -> 9
        let scores: Vec<u32> = (0..=10).map(|i| i * 10).collect();
        assert_eq!(quantile_bounds(&scores, &QS), RatingBounds([10, 30, 70, 90]));
        // n = 6, p=10 -> 0.5 -> 0, p=30 -> 1.5 -> 2, p=70 -> 3.5 -> 4, p=90 -> 4.5 -> 4
        let scores = [5, 15, 25, 35, 45, 55];
        assert_eq!(quantile_bounds(&scores, &QS), RatingBounds([5, 25, 45, 45]));
    }

    #[test]
    fn quantile_empty_falls_back_to_fixed() {
        assert_eq!(quantile_bounds(&[], &QS), RatingBounds::FIXED);
    }

    #[test]
    fn hybrid_clamps_to_guard() {
        let clustered = [50; 10];
        assert_eq!(
            bounds(&clustered, RatingScheme::Hybrid, &QS, 5),
            RatingBounds([25, 45, 55, 75])
        );
        assert_eq!(
            bounds(&clustered, RatingScheme::Quantile, &QS, 5),
            RatingBounds([50, 50, 50, 50])
        );
    }

    #[test]
    fn scheme_parsing() {
        assert_eq!("fixed".parse::<RatingScheme>().unwrap(), RatingScheme::Fixed);
        assert_eq!(" Hybrid ".parse::<RatingScheme>().unwrap(), RatingScheme::Hybrid);
        assert!(matches!(
            "median".parse::<RatingScheme>(),
            Err(ConfigError::UnknownScheme(_))
        ));
    }

    #[test]
    fn hysteresis_blocks_marginal_upgrade() {
        let b = RatingBounds::FIXED;
        let mut state = BandState::new();
        assert_eq!(state.commit("XLK", 50, &b, 5), Band::Hold);
        assert_eq!(state.commit("XLK", 61, &b, 5), Band::Hold);
        assert_eq!(state.commit("XLK", 66, &b, 5), Band::Buy);
    }

    #[test]
    fn hysteresis_downgrade_uses_current_band_floor() {
        let b = RatingBounds::FIXED;
        let mut state = BandState::new();
        state.commit("XLK", 70, &b, 5);
        // Current band Buy starts at 60; must drop below 55
        assert_eq!(state.commit("XLK", 56, &b, 5), Band::Buy);
        assert_eq!(state.commit("XLK", 54, &b, 5), Band::Hold);
    }

    #[test]
    fn zero_hysteresis_follows_raw_band_but_records_it() {
        let b = RatingBounds::FIXED;
        let mut state = BandState::new();
        assert_eq!(state.commit("XLF", 61, &b, 0), Band::Buy);
        assert_eq!(state.get("XLF"), Some(Band::Buy));
        assert_eq!(state.commit("XLF", 59, &b, 0), Band::Hold);
    }

    #[test]
    fn rate_commits_every_symbol() {
        let scores = vec![("XLK".to_string(), 90), ("XLE".to_string(), 10)];
        let mut state = BandState::new();
        let config = RatingConfig {
            scheme: RatingScheme::Fixed,
            ..RatingConfig::default()
        };
        let (cuts, rated) = rate(&scores, &config, &mut state);
        assert_eq!(cuts, RatingBounds::FIXED);
        assert_eq!(rated[0].rating.band, Band::StrongBuy);
        assert_eq!(rated[1].rating.band, Band::StrongSell);
        assert_eq!(state.len(), 2);
    }
}
