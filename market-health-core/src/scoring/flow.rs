//! Category C: Position & Flow.
//!
//! ETF-only proxies built from price and volume. No options, dark-pool or
//! short-interest feeds.

use super::{bucket, CategoryOutcome, NEUTRAL};
use crate::data::PriceHistory;
use crate::indicators::{atr, ema, last, linreg_slope, obv, sma};

pub const MIN_BARS: usize = 30;
const FLOW_LOOKBACK: usize = 10;
const WINDOW: usize = 20;

/// Volume on the last `lookback` up bars and the last `lookback` down bars.
fn directional_volume(close: &[f64], volume: &[f64], lookback: usize) -> (f64, f64) {
    let mut up = Vec::new();
    let mut down = Vec::new();
    for i in 1..close.len().min(volume.len()) {
        let diff = close[i] - close[i - 1];
        if diff > 0.0 {
            up.push(volume[i]);
        } else if diff < 0.0 {
            down.push(volume[i]);
        }
    }
    let tail_sum = |v: &[f64]| -> f64 {
        v[v.len().saturating_sub(lookback)..]
            .iter()
            .filter(|x| !x.is_nan())
            .sum()
    };
    (tail_sum(&up), tail_sum(&down))
}

/// Category C checks from volume and price flow.
pub fn score(history: &PriceHistory) -> CategoryOutcome {
    let (close, volume) = (&history.close, &history.volume);
    if close.len() < MIN_BARS {
        return CategoryOutcome::insufficient(format!("{} closes, need {MIN_BARS}", close.len()));
    }
    if volume.is_empty() {
        return CategoryOutcome::insufficient("no volume");
    }
    let n = close.len();
    let e20 = ema(close, 20);
    let s20 = sma(close, WINDOW);

    let atr14 = atr(&history.high, &history.low, close, 14);
    let atr_last = last(&atr14);
    let em_fit = if atr_last > 0.0 {
        bucket((last(close) - last(&e20)).abs() / atr_last, |fit| {
            if fit <= 1.0 {
                2
            } else if fit <= 2.0 {
                1
            } else {
                0
            }
        })
    } else {
        NEUTRAL
    };

    let (up_vol, down_vol) = directional_volume(close, volume, FLOW_LOOKBACK);
    let oi_flow = if down_vol > 0.0 {
        bucket(up_vol / down_vol, |ratio| {
            if ratio > 1.2 {
                2
            } else if ratio >= 0.9 {
                1
            } else {
                0
            }
        })
    } else {
        NEUTRAL
    };

    let blocks = if volume.len() >= WINDOW && last(volume) > 0.0 {
        bucket(last(volume) / last(&sma(volume, WINDOW)), |vr| {
            if vr >= 1.5 {
                2
            } else if vr >= 1.1 {
                1
            } else {
                0
            }
        })
    } else {
        NEUTRAL
    };

    let above = (n - WINDOW..n).filter(|&i| close[i] > s20[i]).count();
    let above_frac = above as f64 / WINDOW as f64;
    let leaders = if above_frac >= 0.60 {
        2
    } else if above_frac >= 0.50 {
        1
    } else {
        0
    };

    let money_flow = if volume.iter().any(|v| !v.is_nan()) {
        let obv = obv(close, volume);
        if obv.len() >= WINDOW {
            bucket(linreg_slope(&obv[obv.len() - WINDOW..]), |slope| {
                if slope > 0.0 {
                    2
                } else if slope.abs() < 1e-6 {
                    1
                } else {
                    0
                }
            })
        } else {
            NEUTRAL
        }
    } else {
        NEUTRAL
    };

    CategoryOutcome::Scored([em_fit, oi_flow, blocks, leaders, money_flow, NEUTRAL])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(close: Vec<f64>, volume: Vec<f64>) -> PriceHistory {
        PriceHistory {
            high: close.iter().map(|c| c + 1.0).collect(),
            low: close.iter().map(|c| c - 1.0).collect(),
            volume,
            ..PriceHistory::from_closes(close)
        }
    }

    #[test]
    fn needs_thirty_bars_and_volume() {
        let short = history(vec![100.0; 29], vec![1.0; 29]);
        assert!(matches!(score(&short), CategoryOutcome::Insufficient(_)));
        let no_volume = history(vec![100.0; 40], vec![]);
        assert!(matches!(score(&no_volume), CategoryOutcome::Insufficient(_)));
    }

    #[test]
    fn accumulation_scores_well() {
        // Two steps up, one step down; heavier volume on up days
        let mut close = vec![100.0];
        let mut volume = vec![1000.0];
        for i in 1..40 {
            let prev = close[i - 1];
            if i % 3 == 0 {
                close.push(prev - 0.5);
                volume.push(800.0);
            } else {
                close.push(prev + 0.5);
                volume.push(1200.0);
            }
        }
        let CategoryOutcome::Scored(s) = score(&history(close, volume)) else {
            panic!("expected scored outcome");
        };
        assert_eq!(s[1], 2, "up volume dominates");
        assert_eq!(s[2], 0, "last volume is not a spike");
        assert_eq!(s[3], 2, "closes hold above SMA20");
        assert_eq!(s[4], 2, "OBV rising");
        assert_eq!(s[5], 1);
    }

    #[test]
    fn flat_market_without_down_days_is_neutral_on_flow() {
        let s = score(&history(vec![100.0; 40], vec![1000.0; 40]));
        let CategoryOutcome::Scored(s) = s else {
            panic!("expected scored outcome");
        };
        assert_eq!(s[1], 1);
        // No close strictly above SMA20
        assert_eq!(s[3], 0);
        // Flat OBV
        assert_eq!(s[4], 1);
    }

    #[test]
    fn directional_volume_takes_recent_bars() {
        let close = [1.0, 2.0, 3.0, 2.0, 3.0];
        let volume = [0.0, 10.0, 20.0, 5.0, 40.0];
        assert_eq!(directional_volume(&close, &volume, 2), (60.0, 5.0));
    }
}
