//! Technical indicators over plain `f64` slices.
//!
//! Every function returns a series aligned with its input, NaN where the
//! value is undefined. Nothing here allocates state across calls.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod sma;
pub mod stats;

pub use atr::{atr, true_range};
pub use bollinger::{band_width_pct, rolling_std};
pub use ema::ema;
pub use sma::{rolling_max, sma};
pub use stats::{
    last, last_defined, linreg_slope, obv, paired_returns, pct_change, pct_change_over, pearson,
    ret_over,
};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
