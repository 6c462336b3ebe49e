//! Check: a single bounded qualitative observation.

use serde::{Deserialize, Serialize};

/// One observation within a category, scored 0 (weak), 1 (neutral) or 2 (good).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub label: String,
    pub score: u8,
}

impl Check {
    /// Highest score a single check can carry.
    pub const MAX_SCORE: u8 = 2;

    /// Build a check, clamping the score into `0..=2`.
    pub fn new(label: impl Into<String>, score: u8) -> Self {
        Self {
            label: label.into(),
            score: score.min(Self::MAX_SCORE),
        }
    }

    /// Full marks.
    pub fn is_good(&self) -> bool {
        self.score >= 2
    }

    /// Scored zero.
    pub fn is_weak(&self) -> bool {
        self.score == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_clamped() {
        assert_eq!(Check::new("Vol x", 7).score, 2);
        assert_eq!(Check::new("Vol x", 1).score, 1);
    }

    #[test]
    fn serializes_as_label_and_score() {
        let json = serde_json::to_string(&Check::new("ATR%", 2)).unwrap();
        assert_eq!(json, r#"{"label":"ATR%","score":2}"#);
    }
}
