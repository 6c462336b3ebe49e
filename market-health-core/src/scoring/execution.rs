//! Category F: Execution & Frictions.
//!
//! Trade-plan checks need an order ticket, which a sector scan does not have.
//! Every check is neutral.

use super::{CategoryOutcome, NEUTRAL};
use crate::domain::CHECKS_PER_CATEGORY;

pub fn score() -> CategoryOutcome {
    CategoryOutcome::Scored([NEUTRAL; CHECKS_PER_CATEGORY])
}
