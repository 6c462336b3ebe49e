//! Returns, correlation and regression helpers.

use std::collections::HashMap;

/// Last element, or NaN when empty.
pub fn last(values: &[f64]) -> f64 {
    values.last().copied().unwrap_or(f64::NAN)
}

/// Last non-NaN element, or NaN when there is none.
pub fn last_defined(values: &[f64]) -> f64 {
    values
        .iter()
        .rev()
        .copied()
        .find(|v| !v.is_nan())
        .unwrap_or(f64::NAN)
}

/// One-bar simple returns. `out[0]` is NaN.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    pct_change_over(values, 1)
}

/// `n`-bar simple returns: `x[i] / x[i-n] - 1`. The first `n` outputs are NaN.
pub fn pct_change_over(values: &[f64], n: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < n || n == 0 {
                f64::NAN
            } else {
                values[i] / values[i - n] - 1.0
            }
        })
        .collect()
}

/// Return from `n` bars ago to the last bar. NaN without enough history.
pub fn ret_over(values: &[f64], n: usize) -> f64 {
    let len = values.len();
    if len <= n {
        return f64::NAN;
    }
    values[len - 1] / values[len - 1 - n] - 1.0
}

/// Returns of two series paired by timestamp, in `a`'s order.
///
/// Pairs where either return is undefined are dropped.
pub fn paired_returns(a_ts: &[i64], a: &[f64], b_ts: &[i64], b: &[f64]) -> Vec<(f64, f64)> {
    let b_returns: HashMap<i64, f64> = b_ts.iter().copied().zip(pct_change(b)).collect();
    a_ts.iter()
        .zip(pct_change(a))
        .filter_map(|(ts, ra)| b_returns.get(ts).map(|&rb| (ra, rb)))
        .filter(|(ra, rb)| ra.is_finite() && rb.is_finite())
        .collect()
}

/// Pearson correlation. NaN for fewer than two pairs or zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / nf;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        sxy / denom
    }
}

/// Least-squares slope of `values` against `0..n`.
pub fn linreg_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / nf;
    let mut num = 0.0;
    let mut denom = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        denom += dx * dx;
    }
    if denom > 0.0 {
        num / denom
    } else {
        f64::NAN
    }
}

/// On-balance volume. Missing volume counts as zero, a flat or undefined move as no direction.
pub fn obv(close: &[f64], volume: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    (0..close.len().min(volume.len()))
        .map(|i| {
            let diff = if i == 0 { 0.0 } else { close[i] - close[i - 1] };
            let direction = if diff > 0.0 {
                1.0
            } else if diff < 0.0 {
                -1.0
            } else {
                0.0
            };
            let vol = if volume[i].is_nan() { 0.0 } else { volume[i] };
            total += direction * vol;
            total
        })
        .collect()
}
