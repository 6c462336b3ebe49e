//! Category D: Risk & Volatility.

use super::{bucket, CategoryOutcome, NEUTRAL};
use crate::data::PriceHistory;
use crate::indicators::{atr, band_width_pct, ema, last, last_defined, paired_returns, pearson};

const ATR_PERIOD: usize = 14;
const CORRELATION_WINDOW: usize = 20;
const MIN_CORRELATION_PAIRS: usize = 5;

/// Category D checks: ATR, band width and benchmark correlation.
pub fn score(history: &PriceHistory, benchmark: &PriceHistory) -> CategoryOutcome {
    let (close, high, low) = (&history.close, &history.high, &history.low);
    if close.is_empty() || high.is_empty() || low.is_empty() {
        return CategoryOutcome::insufficient("missing close/high/low");
    }
    if close.iter().all(|v| v.is_nan()) {
        return CategoryOutcome::insufficient("no defined closes");
    }

    let atr14 = atr(high, low, close, ATR_PERIOD);
    let atr_pct: Vec<f64> = atr14
        .iter()
        .zip(close)
        .map(|(a, c)| a / c * 100.0)
        .collect();
    let atr_score = bucket(last_defined(&atr_pct), |x| {
        if (1.0..=3.0).contains(&x) {
            2
        } else if (0.5..1.0).contains(&x) || (x > 3.0 && x <= 4.5) {
            1
        } else {
            0
        }
    });

    let iv_score = bucket(last_defined(&band_width_pct(close, 20, 2.0)), |x| {
        if (2.0..=6.0).contains(&x) {
            2
        } else if (1.0..2.0).contains(&x) || (x > 6.0 && x <= 9.0) {
            1
        } else {
            0
        }
    });

    let correlation = if benchmark.is_empty() {
        NEUTRAL
    } else {
        let pairs = paired_returns(
            &history.timestamps,
            close,
            &benchmark.timestamps,
            &benchmark.close,
        );
        let recent = &pairs[pairs.len().saturating_sub(CORRELATION_WINDOW)..];
        if recent.len() < MIN_CORRELATION_PAIRS {
            NEUTRAL
        } else {
            bucket(pearson(recent), |r| {
                if (0.60..=0.95).contains(&r) {
                    2
                } else if (0.30..0.60).contains(&r) {
                    1
                } else {
                    0
                }
            })
        }
    };

    let atr_last = last_defined(&atr14);
    let sizing = if atr_last > 0.0 {
        let e20 = ema(close, 20);
        bucket((last(close) - last(&e20)).abs() / atr_last, |ratio| {
            if ratio <= 1.0 {
                2
            } else if ratio <= 2.0 {
                1
            } else {
                0
            }
        })
    } else {
        NEUTRAL
    };

    CategoryOutcome::Scored([atr_score, iv_score, correlation, NEUTRAL, NEUTRAL, sizing])
}
