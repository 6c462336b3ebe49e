//! Upstream price source abstraction.
//!
//! The fetcher only ever talks to a `PriceSource`. Production code uses
//! `YahooProvider`; tests use scripted fakes that count calls.

use super::frame::PriceFrame;
use thiserror::Error;

/// Errors from a single upstream fetch attempt.
///
/// None of these escape a scoring pass: the fetcher treats every variant as a
/// failed attempt and moves on to the next strategy.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("circuit breaker tripped, provider is cooling down")]
    CircuitBreakerTripped,

    #[error("no Close column in frame for {symbol}")]
    MissingClose { symbol: String },

    #[error("frame error: {0}")]
    Frame(String),
}

impl From<polars::error::PolarsError> for DataError {
    fn from(err: polars::error::PolarsError) -> Self {
        DataError::Frame(err.to_string())
    }
}

/// Upstream call style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// Multi-symbol download endpoint; frames may carry composite `field:symbol` labels.
    Batch,
    /// Single-ticker history endpoint; frames carry flat labels.
    Single,
}

/// Parameters of one upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Lookback window, e.g. `1y`, `6mo`.
    pub period: String,
    /// Sampling interval, e.g. `1d`, `1h`.
    pub interval: String,
    /// Whether OHLC should be dividend/split adjusted.
    pub adjusted: bool,
}

/// A source of historical price tables.
pub trait PriceSource {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Batch-style download for one symbol.
    fn download(&self, symbol: &str, request: &FetchRequest) -> Result<PriceFrame, DataError>;

    /// Single-ticker history call.
    fn history(&self, symbol: &str, request: &FetchRequest) -> Result<PriceFrame, DataError>;

    /// Dispatch on the call style.
    fn fetch(
        &self,
        mode: FetchMode,
        symbol: &str,
        request: &FetchRequest,
    ) -> Result<PriceFrame, DataError> {
        match mode {
            FetchMode::Batch => self.download(symbol, request),
            FetchMode::Single => self.history(symbol, request),
        }
    }
}
