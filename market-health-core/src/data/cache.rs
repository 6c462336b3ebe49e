//! Time-bounded in-memory fetch cache.
//!
//! Keyed by `(symbol, period, interval)`. Entries are never evicted: a stale
//! entry is still the fallback when every fetch strategy fails. The cache is
//! owned by the caller and threaded through acquisition as `&mut`, so watch
//! mode reuses it across passes and tests get a fresh one each.

use super::frame::PriceFrame;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

// Large enough to mean "never expires" without overflowing chrono.
const MAX_TTL_SECS: u64 = 1 << 40;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub period: String,
    pub interval: String,
}

impl CacheKey {
    /// Key for one `(symbol, period, interval)` request.
    pub fn new(symbol: &str, period: &str, interval: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            period: period.to_string(),
            interval: interval.to_string(),
        }
    }
}

/// A fetched frame plus when it was fetched. The frame may be empty.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub frame: PriceFrame,
}

impl CacheEntry {
    /// Fresh while `now - fetched_at < max(1, ttl_secs)` seconds.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        let ttl = Duration::seconds(ttl_secs.clamp(1, MAX_TTL_SECS) as i64);
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl FetchCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Any entry for `key`, fresh or stale.
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// The entry for `key` only if it is still fresh at `now`.
    pub fn fresh(&self, key: &CacheKey, now: DateTime<Utc>, ttl_secs: u64) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|e| e.is_fresh(now, ttl_secs))
    }

    /// Record a fetch result, replacing any previous entry.
    pub fn insert(&mut self, key: CacheKey, frame: PriceFrame, fetched_at: DateTime<Utc>) {
        self.entries.insert(key, CacheEntry { fetched_at, frame });
    }

    /// Entries held, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_ttl() {
        let t0 = Utc::now();
        let entry = CacheEntry {
            fetched_at: t0,
            frame: PriceFrame::empty(),
        };
        assert!(entry.is_fresh(t0 + Duration::seconds(299), 300));
        assert!(!entry.is_fresh(t0 + Duration::seconds(300), 300));
    }

    #[test]
    fn zero_ttl_is_treated_as_one_second() {
        let t0 = Utc::now();
        let entry = CacheEntry {
            fetched_at: t0,
            frame: PriceFrame::empty(),
        };
        assert!(entry.is_fresh(t0, 0));
        assert!(!entry.is_fresh(t0 + Duration::seconds(1), 0));
    }

    #[test]
    fn keys_distinguish_period_and_interval() {
        let mut cache = FetchCache::new();
        let now = Utc::now();
        cache.insert(CacheKey::new("XLK", "1y", "1d"), PriceFrame::empty(), now);
        assert!(cache.get(&CacheKey::new("XLK", "1y", "1d")).is_some());
        assert!(cache.get(&CacheKey::new("XLK", "6mo", "1d")).is_none());
        assert!(cache.get(&CacheKey::new("XLK", "1y", "1h")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stale_entries_are_kept_but_not_fresh() {
        let mut cache = FetchCache::new();
        let key = CacheKey::new("SPY", "1y", "1d");
        let then = Utc::now() - Duration::hours(2);
        cache.insert(key.clone(), PriceFrame::empty(), then);
        assert!(cache.fresh(&key, Utc::now(), 300).is_none());
        assert!(cache.get(&key).is_some());
        cache.clear();
        assert!(cache.is_empty());
    }
}
