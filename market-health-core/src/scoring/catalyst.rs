//! Category A: Catalyst Health.
//!
//! Only News has a price/volume proxy. The rest stay neutral until a real
//! catalyst feed exists.

use super::{bucket, CategoryOutcome, NEUTRAL};
use crate::data::PriceHistory;
use crate::indicators::{last, pct_change, sma};

pub const MIN_BARS: usize = 21;

/// Category A checks. Only News moves off neutral.
pub fn score(history: &PriceHistory) -> CategoryOutcome {
    let close = &history.close;
    if close.len() < MIN_BARS {
        return CategoryOutcome::insufficient(format!("{} closes, need {MIN_BARS}", close.len()));
    }

    let ret1 = last(&pct_change(close));
    let volume = &history.volume;
    let boost = if volume.len() >= 20 && last(volume) > 0.0 {
        last(volume) / last(&sma(volume, 20))
    } else {
        1.0
    };
    let boost = if boost.is_finite() { boost } else { 1.0 };

    let news = if boost >= 1.5 {
        2
    } else {
        bucket(ret1, |r| {
            if r.abs() >= 0.02 {
                2
            } else if r.abs() >= 0.005 {
                1
            } else {
                0
            }
        })
    };

    CategoryOutcome::Scored([news, NEUTRAL, NEUTRAL, NEUTRAL, NEUTRAL, NEUTRAL])
}
