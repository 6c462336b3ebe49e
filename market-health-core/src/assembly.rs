//! One scoring pass: fetch, rank, score, assemble.

use crate::config::ScoreConfig;
use crate::data::{FetchCache, FetchPolicy, Fetcher, PriceFrame, PriceHistory, PriceSource};
use crate::domain::{SectorRow, BENCHMARK_SYMBOL, VOLATILITY_SYMBOL};
use crate::scoring::{rank_sectors, score_symbol, MarketContext};
use std::collections::{BTreeMap, HashMap};

/// Symbols to fetch: sectors in order (deduplicated), then the benchmark and volatility index.
pub fn fetch_universe(sectors: &[String]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::with_capacity(sectors.len() + 2);
    let extras = [BENCHMARK_SYMBOL, VOLATILITY_SYMBOL];
    for sym in sectors.iter().map(String::as_str).chain(extras) {
        if !symbols.iter().any(|s| s == sym) {
            symbols.push(sym.to_string());
        }
    }
    symbols
}

/// Score `sectors` from already-fetched frames. Missing frames score as empty histories.
pub fn score_frames(sectors: &[String], frames: &BTreeMap<String, PriceFrame>) -> Vec<SectorRow> {
    let history = |sym: &str| {
        frames
            .get(sym)
            .map(|f| PriceHistory::from_frame(f, sym))
            .unwrap_or_default()
    };

    let benchmark = history(BENCHMARK_SYMBOL);
    let volatility = history(VOLATILITY_SYMBOL);
    let histories: HashMap<&str, PriceHistory> =
        sectors.iter().map(|s| (s.as_str(), history(s))).collect();

    let ranks = rank_sectors(
        sectors
            .iter()
            .filter_map(|s| histories.get(s.as_str()).map(|h| (s.as_str(), h.close.as_slice()))),
    );
    let ctx = MarketContext {
        benchmark: &benchmark,
        volatility: &volatility,
        ranks: &ranks,
    };

    sectors
        .iter()
        .map(|sym| {
            let h = histories.get(sym.as_str()).cloned().unwrap_or_default();
            if h.is_empty() {
                log::warn!("{sym}: no price data, scoring with defaults");
            }
            score_symbol(sym, &h, &ctx)
        })
        .collect()
}

/// Run a full scoring pass against `source`, reusing and updating `cache`.
///
/// Never fails: upstream problems degrade individual symbols to default checks.
pub fn compute_scores(
    source: &dyn PriceSource,
    cache: &mut FetchCache,
    config: &ScoreConfig,
) -> Vec<SectorRow> {
    let policy = FetchPolicy {
        ttl_secs: config.ttl,
        delay: config.delay(),
        ..FetchPolicy::default()
    };
    let fetcher = Fetcher::new(source, policy);
    let symbols = fetch_universe(&config.sectors);
    log::info!(
        "scoring {} sectors ({} symbols, period={}, interval={})",
        config.sectors.len(),
        symbols.len(),
        config.period,
        config.interval
    );
    let frames = fetcher.fetch(cache, &symbols, &config.period, &config.interval);
    score_frames(&config.sectors, &frames)
}
