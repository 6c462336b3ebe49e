//! Category B: Trend & Structure.

use super::{bucket, CategoryOutcome};
use crate::data::PriceHistory;
use crate::indicators::{ema, last, ret_over, rolling_max, sma};

pub const MIN_BARS: usize = 60;

/// Category B checks. Needs `MIN_BARS` closes.
pub fn score(history: &PriceHistory, benchmark_close: &[f64]) -> CategoryOutcome {
    let close = &history.close;
    let n = close.len();
    if n < MIN_BARS {
        return CategoryOutcome::insufficient(format!("{n} closes, need {MIN_BARS}"));
    }

    let e9 = ema(close, 9);
    let e20 = ema(close, 20);
    let s50 = sma(close, 50);
    let mid20 = sma(close, 20);
    let c = last(close);
    let (e9_last, e20_last, s50_last, mid_last) = (last(&e9), last(&e20), last(&s50), last(&mid20));

    let stacked = if c > e9_last && e9_last > e20_last && e20_last > s50_last {
        2
    } else if c > e20_last && e20_last > s50_last {
        1
    } else {
        0
    };

    let benchmark_ret = if benchmark_close.len() > 5 {
        ret_over(benchmark_close, 5)
    } else {
        0.0
    };
    let rs_vs_spy = bucket(ret_over(close, 5) - benchmark_ret, |rs5| {
        if rs5 > 0.0 {
            2
        } else if rs5.abs() < 0.002 {
            1
        } else {
            0
        }
    });

    let above_mid = |i: usize| close[i] > mid20[i];
    let bb_mid = if above_mid(n - 1) && above_mid(n - 2) {
        2
    } else if above_mid(n - 1) {
        1
    } else {
        0
    };

    let high = &history.high;
    let breakout = if high.len() >= 21 {
        // Highest high of the 20 bars before the last one
        let prior_high = rolling_max(high, 20)[high.len() - 2];
        if c > prior_high {
            2
        } else if c > mid_last {
            1
        } else {
            0
        }
    } else {
        0
    };

    let volume = &history.volume;
    let vol_x = if volume.len() >= 20 && volume.iter().any(|v| !v.is_nan()) {
        bucket(last(volume) / last(&sma(volume, 20)), |vr| {
            if vr >= 1.5 {
                2
            } else if vr >= 1.1 {
                1
            } else {
                0
            }
        })
    } else {
        1
    };

    let held = close[n - 5..]
        .iter()
        .zip(&e20[n - 5..])
        .all(|(c, e)| c >= e);
    let hold_20ema = if held {
        2
    } else if c >= e20_last {
        1
    } else {
        0
    };

    CategoryOutcome::Scored([stacked, rs_vs_spy, bb_mid, breakout, vol_x, hold_20ema])
}
