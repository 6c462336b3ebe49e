//! Simple rolling windows: mean and max.
//!
//! Both need a full window. Any NaN inside the window makes that output NaN.

/// Rolling arithmetic mean over `period` values.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().sum::<f64>() / period as f64)
}

/// Rolling maximum over `period` values.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

fn rolling(values: &[f64], period: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    for end in period..=n {
        let window = &values[end - period..end];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[end - 1] = f(window);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_3_known_values() {
        let result = sma(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_nan_taints_its_windows_only() {
        let result = sma(&[10.0, f64::NAN, 12.0, 13.0, 14.0], 2);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_short_input_is_all_nan() {
        assert!(sma(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_max_known_values() {
        let result = rolling_max(&[3.0, 1.0, 4.0, 1.0, 5.0], 2);
        assert!(result[0].is_nan());
        assert_eq!(&result[1..], &[3.0, 4.0, 4.0, 5.0]);
    }
}
