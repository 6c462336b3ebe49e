//! Multi-strategy acquisition with cache fallback.
//!
//! For each symbol: reuse a fresh cache entry, otherwise walk the strategy
//! list until one attempt yields at least `min_bars` bars. Short results are
//! kept as a best-effort answer. When nothing works, the last cached frame
//! (however stale) wins over an empty one. Whatever comes out is written back
//! to the cache, so a failing symbol is not refetched inside the TTL.
//!
//! Upstream errors never escape `fetch`; they are logged and treated as a
//! failed attempt.

use super::cache::{CacheKey, FetchCache};
use super::frame::PriceFrame;
use super::provider::{DataError, FetchMode, FetchRequest, PriceSource};
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;

/// Bars needed for an attempt to be accepted without trying further strategies.
pub const MIN_ACCEPTED_BARS: usize = 60;

/// Lookback used by the short-window strategies.
pub const FALLBACK_PERIOD: &str = "6mo";

/// Which lookback a strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The caller's requested period.
    Primary,
    /// `FALLBACK_PERIOD`.
    Fallback,
}

/// One fetch attempt descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStrategy {
    pub mode: FetchMode,
    pub adjusted: bool,
    pub window: Window,
}

impl FetchStrategy {
    const fn new(mode: FetchMode, adjusted: bool, window: Window) -> Self {
        Self {
            mode,
            adjusted,
            window,
        }
    }

    fn request(&self, period: &str, interval: &str) -> FetchRequest {
        FetchRequest {
            period: match self.window {
                Window::Primary => period.to_string(),
                Window::Fallback => FALLBACK_PERIOD.to_string(),
            },
            interval: interval.to_string(),
            adjusted: self.adjusted,
        }
    }
}

/// Attempt order: unadjusted before adjusted, batch before single, full window before short.
pub const DEFAULT_STRATEGIES: [FetchStrategy; 6] = [
    FetchStrategy::new(FetchMode::Batch, false, Window::Primary),
    FetchStrategy::new(FetchMode::Batch, true, Window::Primary),
    FetchStrategy::new(FetchMode::Single, false, Window::Primary),
    FetchStrategy::new(FetchMode::Single, true, Window::Primary),
    FetchStrategy::new(FetchMode::Batch, true, Window::Fallback),
    FetchStrategy::new(FetchMode::Single, true, Window::Fallback),
];

/// Freshness and throttle knobs.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Cache freshness in seconds (values below 1 act as 1).
    pub ttl_secs: u64,
    /// Pause between attempts and between network-fetched symbols.
    pub delay: Duration,
    pub min_bars: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            delay: Duration::from_millis(250),
            min_bars: MIN_ACCEPTED_BARS,
        }
    }
}

/// Sequential, throttled acquisition over a `PriceSource`.
pub struct Fetcher<'a> {
    source: &'a dyn PriceSource,
    policy: FetchPolicy,
    strategies: &'a [FetchStrategy],
}

impl<'a> Fetcher<'a> {
    /// Fetcher over `source` using the default strategy chain.
    pub fn new(source: &'a dyn PriceSource, policy: FetchPolicy) -> Self {
        Self {
            source,
            policy,
            strategies: &DEFAULT_STRATEGIES,
        }
    }

    /// Fetch every symbol, in order. Each symbol maps to a (possibly empty) frame.
    pub fn fetch(
        &self,
        cache: &mut FetchCache,
        symbols: &[String],
        period: &str,
        interval: &str,
    ) -> BTreeMap<String, PriceFrame> {
        let now = Utc::now();
        let mut out = BTreeMap::new();

        for symbol in symbols {
            let key = CacheKey::new(symbol, period, interval);
            if let Some(entry) = cache.fresh(&key, now, self.policy.ttl_secs) {
                log::debug!("{symbol}: cache hit ({} bars)", entry.frame.len());
                out.insert(symbol.clone(), entry.frame.clone());
                continue;
            }

            let mut frame = self.try_strategies(symbol, period, interval);
            if frame.is_empty() {
                match cache.get(&key) {
                    Some(stale) => {
                        log::warn!(
                            "{symbol}: all fetch strategies failed, using cached data from {}",
                            stale.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
                        );
                        frame = stale.frame.clone();
                    }
                    None => log::warn!("{symbol}: all fetch strategies failed, no data"),
                }
            }

            cache.insert(key, frame.clone(), Utc::now());
            out.insert(symbol.clone(), frame);
            self.pause();
        }

        out
    }

    fn try_strategies(&self, symbol: &str, period: &str, interval: &str) -> PriceFrame {
        let mut best_short: Option<PriceFrame> = None;

        for (i, strategy) in self.strategies.iter().enumerate() {
            let request = strategy.request(period, interval);
            match self.attempt(symbol, strategy.mode, &request) {
                Ok(frame) if frame.len() >= self.policy.min_bars => {
                    log::info!(
                        "{symbol}: {} bars via {} ({:?}, adjusted={}, {})",
                        frame.len(),
                        self.source.name(),
                        strategy.mode,
                        request.adjusted,
                        request.period
                    );
                    return frame;
                }
                Ok(frame) => {
                    log::debug!(
                        "{symbol}: strategy {} returned only {} bars",
                        i + 1,
                        frame.len()
                    );
                    if best_short.as_ref().map_or(true, |b| frame.len() > b.len()) {
                        best_short = Some(frame);
                    }
                }
                Err(e) => log::debug!("{symbol}: strategy {} failed: {e}", i + 1),
            }
            self.pause();
        }

        best_short.unwrap_or_default()
    }

    fn attempt(
        &self,
        symbol: &str,
        mode: FetchMode,
        request: &FetchRequest,
    ) -> Result<PriceFrame, DataError> {
        let frame = self.source.fetch(mode, symbol, request)?.normalize(symbol)?;
        if frame.is_empty() || !frame.has_close() {
            return Err(DataError::MissingClose {
                symbol: symbol.to_string(),
            });
        }
        Ok(frame)
    }

    fn pause(&self) {
        if !self.policy.delay.is_zero() {
            std::thread::sleep(self.policy.delay);
        }
    }
}
