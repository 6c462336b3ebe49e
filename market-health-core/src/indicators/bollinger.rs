//! Bollinger band width.
//!
//! Middle: SMA(close, period). Bands: middle +/- mult * stddev.
//! Uses population stddev (divide by N).

use super::sma::sma;

/// Rolling population standard deviation. Same window rules as `sma`.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let means = sma(values, period);
    means
        .iter()
        .enumerate()
        .map(|(i, &mean)| {
            if mean.is_nan() {
                return f64::NAN;
            }
            let window = &values[i + 1 - period..=i];
            let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
            var.sqrt()
        })
        .collect()
}

/// Band width as a percentage of the middle band: (upper - lower) / middle * 100.
pub fn band_width_pct(close: &[f64], period: usize, multiplier: f64) -> Vec<f64> {
    let mid = sma(close, period);
    let sd = rolling_std(close, period);
    mid.iter()
        .zip(&sd)
        .map(|(&m, &s)| {
            let upper = m + multiplier * s;
            let lower = m - multiplier * s;
            (upper - lower) / m * 100.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn population_std_known_value() {
        // 2,4,4,4,5,5,7,9 has population stddev 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = rolling_std(&values, 8);
        assert_approx(sd[7], 2.0, DEFAULT_EPSILON);
        assert!(sd[6].is_nan());
    }

    #[test]
    fn width_pct_known_value() {
        // mean 5, sd 2, mult 2: width 8 / 5 * 100 = 160
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let w = band_width_pct(&values, 8, 2.0);
        assert_approx(w[7], 160.0, 1e-9);
    }

    #[test]
    fn flat_series_has_zero_width() {
        let w = band_width_pct(&[10.0; 5], 5, 2.0);
        assert_approx(w[4], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_middle_is_undefined() {
        let w = band_width_pct(&[0.0; 3], 3, 2.0);
        assert!(w[2].is_nan());
    }
}
