//! Category E: Environment & Regime.

use super::{bucket, CategoryOutcome, SectorRanks, NEUTRAL};
use crate::data::PriceHistory;
use crate::indicators::{ema, last, paired_returns, sma};

pub const MIN_BARS: usize = 60;
const MIN_VIX_BARS: usize = 21;

/// C > EMA20 > SMA50 → 2; C > SMA50 → 1; else 0.
fn trend_stack(close: &[f64]) -> u8 {
    let c = last(close);
    let e20 = last(&ema(close, 20));
    let s50 = last(&sma(close, 50));
    if c > e20 && e20 > s50 {
        2
    } else if c > s50 {
        1
    } else {
        0
    }
}

/// Sum of (symbol − benchmark) returns over the symbol's last three bars, paired by timestamp.
fn three_day_rs(history: &PriceHistory, benchmark: &PriceHistory) -> f64 {
    let start = history.close.len().saturating_sub(4);
    paired_returns(
        &history.timestamps[start..],
        &history.close[start..],
        &benchmark.timestamps,
        &benchmark.close,
    )
    .iter()
    .map(|(s, b)| s - b)
    .sum()
}

/// Category E checks for `symbol` against the benchmark, volatility index and sector ranks.
pub fn score(
    symbol: &str,
    history: &PriceHistory,
    benchmark: &PriceHistory,
    volatility: &PriceHistory,
    ranks: &SectorRanks,
) -> CategoryOutcome {
    if history.len() < MIN_BARS {
        return CategoryOutcome::insufficient(format!("{} closes, need {MIN_BARS}", history.len()));
    }
    if benchmark.len() < MIN_BARS {
        return CategoryOutcome::insufficient(format!(
            "{} benchmark closes, need {MIN_BARS}",
            benchmark.len()
        ));
    }

    let spy_trend = trend_stack(&benchmark.close);

    let sector_rank = match ranks.get(symbol) {
        Some(&r) if r <= 3 => 2,
        Some(&r) if r <= 6 => 1,
        _ => 0,
    };

    let breadth = trend_stack(&history.close);

    let vix = &volatility.close;
    let vix_regime = if vix.len() >= MIN_VIX_BARS {
        let (level, mean) = (last(vix), last(&sma(vix, 20)));
        if level.is_finite() && mean.is_finite() {
            if level < mean {
                2
            } else {
                0
            }
        } else {
            NEUTRAL
        }
    } else {
        NEUTRAL
    };

    let rs3 = bucket(three_day_rs(history, benchmark), |x| {
        if x > 0.0 {
            2
        } else if x.abs() < 0.001 {
            1
        } else {
            0
        }
    });

    CategoryOutcome::Scored([spy_trend, sector_rank, breadth, vix_regime, rs3, NEUTRAL])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, start: f64, step: f64) -> PriceHistory {
        PriceHistory::from_closes((0..n).map(|i| start + step * i as f64).collect())
    }

    fn ranks(pairs: &[(&str, usize)]) -> SectorRanks {
        pairs.iter().map(|(s, r)| (s.to_string(), *r)).collect()
    }

    #[test]
    fn short_benchmark_gives_default_set() {
        let outcome = score(
            "XLK",
            &line(80, 100.0, 1.0),
            &line(59, 100.0, 1.0),
            &PriceHistory::default(),
            &SectorRanks::new(),
        );
        assert!(matches!(outcome, CategoryOutcome::Insufficient(_)));
        assert_eq!(outcome.scores(crate::domain::CategoryKey::E), [0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn strong_regime() {
        // Symbol rising faster than a rising benchmark, VIX falling
        let outcome = score(
            "XLK",
            &line(80, 100.0, 2.0),
            &line(80, 100.0, 0.5),
            &line(40, 30.0, -0.2),
            &ranks(&[("XLK", 1)]),
        );
        assert_eq!(outcome, CategoryOutcome::Scored([2, 2, 2, 2, 2, 1]));
    }

    #[test]
    fn weak_regime() {
        let outcome = score(
            "XLE",
            &line(80, 300.0, -2.0),
            &line(80, 300.0, -0.5),
            &line(40, 10.0, 0.5),
            &ranks(&[("XLE", 10)]),
        );
        assert_eq!(outcome, CategoryOutcome::Scored([0, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn rank_buckets_and_missing_inputs() {
        let sym = line(80, 100.0, 1.0);
        let bench = line(80, 100.0, 1.0);
        let score_rank = |r: Option<usize>| {
            let ranks = r.map(|r| ranks(&[("XLK", r)])).unwrap_or_default();
            let CategoryOutcome::Scored(s) =
                score("XLK", &sym, &bench, &PriceHistory::default(), &ranks)
            else {
                panic!("expected scored outcome");
            };
            s
        };
        assert_eq!(score_rank(Some(3))[1], 2);
        assert_eq!(score_rank(Some(6))[1], 1);
        assert_eq!(score_rank(Some(7))[1], 0);
        assert_eq!(score_rank(None)[1], 0);
        // No VIX data is neutral; identical series have zero relative strength
        assert_eq!(score_rank(None)[3], 1);
        assert_eq!(score_rank(None)[4], 1);
    }
}
