//! Average True Range (ATR).
//!
//! True Range: max(|high-low|, |high-prev_close|, |low-prev_close|), ignoring
//! undefined terms. TR[0] = |high-low|.
//! ATR is the EMA (alpha = 2/(n+1)) of TR, not Wilder smoothing.

use super::ema::ema;

/// True Range series. NaN only where every term is undefined.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    (0..n)
        .map(|i| {
            let mut terms = vec![(high[i] - low[i]).abs()];
            if i > 0 {
                let pc = close[i - 1];
                terms.push((high[i] - pc).abs());
                terms.push((low[i] - pc).abs());
            }
            terms
                .into_iter()
                .filter(|t| !t.is_nan())
                .fold(f64::NAN, f64::max)
        })
        .collect()
}

pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    ema(&true_range(high, low, close), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let high = [12.0, 15.0, 14.0];
        let low = [2.0, 9.0, 5.0];
        let close = [10.0, 11.0, 12.0];
        let tr = true_range(&high, &low, &close);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 6.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up_uses_prev_close() {
        let tr = true_range(&[10.0, 25.0], &[8.0, 22.0], &[9.0, 24.0]);
        assert_approx(tr[1], 16.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_missing_prev_close_falls_back_to_range() {
        let tr = true_range(&[10.0, 12.0], &[8.0, 11.0], &[f64::NAN, 11.5]);
        assert_approx(tr[1], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_is_ema_of_true_range() {
        let high = [12.0, 15.0, 14.0];
        let low = [2.0, 9.0, 5.0];
        let close = [10.0, 11.0, 12.0];
        let result = atr(&high, &low, &close, 3);
        // alpha 0.5: 10, 0.5*6+0.5*10 = 8, 0.5*9+0.5*8 = 8.5
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 8.0, DEFAULT_EPSILON);
        assert_approx(result[2], 8.5, DEFAULT_EPSILON);
    }
}
