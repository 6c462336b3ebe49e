//! Yahoo Finance price source.
//!
//! Both call styles hit the v8 chart API with a `range`/`interval` query.
//! `download` labels columns the way multi-symbol downloads do (`Close:XLK`);
//! `history` uses flat labels. There is no retry loop here: the fetcher walks
//! its own strategy list, and the circuit breaker short-circuits once the
//! provider starts refusing us.
//!
//! Yahoo has no official API and changes its payload without notice. Any
//! shape we do not recognize maps to `ResponseFormatChanged`.

use super::circuit_breaker::CircuitBreaker;
use super::frame::{PriceField, PriceFrame, COMPOSITE_SEPARATOR, DATE_COLUMN};
use super::provider::{DataError, FetchMode, FetchRequest, PriceSource};
use polars::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Columnar bars parsed from one chart response. Missing points are `None`.
#[derive(Debug, Default)]
struct ChartSeries {
    timestamps: Vec<i64>,
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
    adj_close: Option<Vec<Option<f64>>>,
}

fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

impl ChartSeries {
    /// Dividend/split adjust OHLC by the `adjclose / close` ratio of each bar.
    fn adjust(&mut self) {
        let Some(adj) = self.adj_close.take() else {
            return;
        };
        for i in 0..self.timestamps.len() {
            let factor = match (at(&adj, i), at(&self.close, i)) {
                (Some(a), Some(c)) if c != 0.0 => a / c,
                _ => continue,
            };
            for series in [&mut self.open, &mut self.high, &mut self.low] {
                if let Some(Some(v)) = series.get_mut(i) {
                    *v *= factor;
                }
            }
            if let Some(slot) = self.close.get_mut(i) {
                *slot = Some(adj[i].unwrap_or_default());
            }
        }
    }

    fn into_frame(self, symbol: &str, mode: FetchMode) -> Result<PriceFrame, DataError> {
        let n = self.timestamps.len();
        let label = |field: PriceField| -> PlSmallStr {
            match mode {
                FetchMode::Batch => {
                    format!("{}{}{}", field.as_str(), COMPOSITE_SEPARATOR, symbol).into()
                }
                FetchMode::Single => field.as_str().into(),
            }
        };
        let pad = |mut v: Vec<Option<f64>>| {
            v.resize(n, None);
            v
        };

        let mut columns = vec![
            Column::new(DATE_COLUMN.into(), self.timestamps),
            Column::new(label(PriceField::Open), pad(self.open)),
            Column::new(label(PriceField::High), pad(self.high)),
            Column::new(label(PriceField::Low), pad(self.low)),
            Column::new(label(PriceField::Close), pad(self.close)),
        ];
        if let Some(adj) = self.adj_close {
            columns.push(Column::new(label(PriceField::AdjClose), pad(adj)));
        }
        columns.push(Column::new(label(PriceField::Volume), pad(self.volume)));

        PriceFrame::from_columns(columns)
    }
}

/// Yahoo Finance v8 chart provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl YahooProvider {
    /// Provider sharing `circuit_breaker` with its callers.
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        Ok(Self {
            client,
            circuit_breaker,
        })
    }

    fn chart_url(symbol: &str, request: &FetchRequest) -> String {
        format!(
            "{BASE_URL}/{symbol}?range={}&interval={}&includeAdjustedClose=true",
            request.period, request.interval
        )
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<ChartSeries, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A valid symbol with no bars in range comes back without timestamps.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_close = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        Ok(ChartSeries {
            timestamps,
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            volume: quote.volume,
            adj_close,
        })
    }

    fn request(
        &self,
        mode: FetchMode,
        symbol: &str,
        request: &FetchRequest,
    ) -> Result<PriceFrame, DataError> {
        if !self.circuit_breaker.is_allowed() {
            log::debug!(
                "{symbol}: circuit breaker open, {}s of cooldown left",
                self.circuit_breaker.remaining_cooldown().as_secs()
            );
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, request);
        log::debug!("GET {url} ({mode:?}, adjusted={})", request.adjusted);

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(DataError::CircuitBreakerTripped);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(DataError::RateLimited { retry_after_secs });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(DataError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            self.circuit_breaker.record_failure();
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let mut series = Self::parse_response(symbol, chart)?;
        self.circuit_breaker.record_success();
        if request.adjusted {
            series.adjust();
        }
        series.into_frame(symbol, mode)
    }
}

impl PriceSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn download(&self, symbol: &str, request: &FetchRequest) -> Result<PriceFrame, DataError> {
        self.request(FetchMode::Batch, symbol, request)
    }

    fn history(&self, symbol: &str, request: &FetchRequest) -> Result<PriceFrame, DataError> {
        self.request(FetchMode::Single, symbol, request)
    }
}
