//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2/(n+1).
//! Seed: the first finite value (no SMA warm-up). Output is NaN until the seed.
//! A NaN input after the seed repeats the previous EMA and does not update it.

pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;

    for (out, &v) in result.iter_mut().zip(values) {
        prev = match (prev, v.is_finite()) {
            (None, true) => Some(v),
            (Some(p), true) => Some(alpha * v + (1.0 - alpha) * p),
            (p, false) => p,
        };
        if let Some(p) = prev {
            *out = p;
        }
    }

    result
}
