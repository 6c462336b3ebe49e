//! Price acquisition: upstream providers, frame normalization, caching and the
//! multi-strategy fetcher.

pub mod cache;
pub mod circuit_breaker;
pub mod fetch;
pub mod frame;
pub mod provider;
pub mod yahoo;

pub use cache::{CacheEntry, CacheKey, FetchCache};
pub use circuit_breaker::CircuitBreaker;
pub use fetch::{
    FetchPolicy, FetchStrategy, Fetcher, Window, DEFAULT_STRATEGIES, FALLBACK_PERIOD,
    MIN_ACCEPTED_BARS,
};
pub use frame::{PriceField, PriceFrame, PriceHistory};
pub use provider::{DataError, FetchMode, FetchRequest, PriceSource};
pub use yahoo::YahooProvider;
