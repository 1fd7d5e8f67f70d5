// =============================================================================
// Daily Bar Provider: HTTP ingestion adapter
// =============================================================================
//
// Fetches historical daily OHLCV bars for one ticker and date range from a
// Yahoo-Finance-style chart endpoint and decodes them into a `PriceSeries`.
// The adapter owns everything the core must not care about: transport
// errors, bounded retries with backoff, request pacing against the upstream
// host, and payload quirks (days with null fields are skipped, never
// zero-filled).

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::market_data::rate_limit::{RequestPacer, RequestPacerSnapshot};
use crate::types::{PricePoint, PriceSeries};

/// Failure modes of the ingestion adapter. Transport and payload problems
/// stay on this side of the boundary; the core only ever sees a well-formed
/// `PriceSeries` or no series at all.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market data provider returned HTTP {0}")]
    Status(u16),

    #[error("could not decode market data payload: {0}")]
    Decode(String),

    #[error("no price data for ticker {0}")]
    Empty(String),

    #[error("upstream request budget exhausted, retry later")]
    Throttled,
}

// -----------------------------------------------------------------------------
// Wire format of the chart endpoint
// -----------------------------------------------------------------------------
//
// GET {base}/v8/finance/chart/{ticker}?period1=..&period2=..&interval=1d
//
// Every field is optional on the wire: halted days arrive as nulls inside
// the quote arrays and unknown tickers arrive as a populated `error` object.

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// -----------------------------------------------------------------------------
// Provider
// -----------------------------------------------------------------------------

/// HTTP client for the daily-bar chart endpoint, with retries and pacing.
pub struct DailyBarProvider {
    base_url: String,
    client: reqwest::Client,
    pacer: RequestPacer,
    max_retries: u32,
    retry_backoff: Duration,
}

impl DailyBarProvider {
    /// Create a provider against `base_url` (no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
        retry_backoff: Duration,
        requests_per_minute: u32,
    ) -> Self {
        let mut default_headers = HeaderMap::new();
        // The chart endpoint rejects requests without a user agent.
        default_headers.insert(USER_AGENT, HeaderValue::from_static("tickerscope/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
            pacer: RequestPacer::new(requests_per_minute),
            max_retries,
            retry_backoff,
        }
    }

    /// Current upstream request budget, for the health endpoint.
    pub fn pacer_snapshot(&self) -> RequestPacerSnapshot {
        self.pacer.snapshot()
    }

    /// Fetch daily bars for `ticker` covering `[start, end]` (inclusive).
    ///
    /// Retries transport failures and 5xx responses up to `max_retries`
    /// times with a fixed backoff; 4xx responses and decode failures are
    /// surfaced immediately since retrying cannot fix them.
    pub async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(ProviderError::Empty(ticker));
        }

        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let period1 = unix_seconds(start);
        // The endpoint treats period2 as exclusive; add a day to include `end`.
        let period2 = unix_seconds(end + chrono::Duration::days(1));

        let mut attempt = 0u32;
        let payload: ChartResponse = loop {
            if !self.pacer.try_acquire() {
                return Err(ProviderError::Throttled);
            }

            let result = self
                .client
                .get(&url)
                .query(&[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                ])
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() && attempt < self.max_retries {
                        warn!(
                            ticker = %ticker,
                            status = status.as_u16(),
                            attempt,
                            "provider returned a server error, retrying"
                        );
                    } else if !status.is_success() {
                        return Err(ProviderError::Status(status.as_u16()));
                    } else {
                        break response
                            .json()
                            .await
                            .map_err(|e| ProviderError::Decode(e.to_string()))?;
                    }
                }
                Err(e) if attempt < self.max_retries => {
                    warn!(ticker = %ticker, error = %e, attempt, "provider request failed, retrying");
                }
                Err(e) => return Err(ProviderError::Http(e)),
            }

            attempt += 1;
            tokio::time::sleep(self.retry_backoff).await;
        };

        let series = series_from_chart(&ticker, payload)?;
        info!(ticker = %ticker, bars = series.len(), "daily bars fetched");
        Ok(series)
    }
}

/// Midnight UTC of `date` as unix seconds.
fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
        .timestamp()
}

/// Decode a chart payload into a `PriceSeries`.
///
/// Bars where any of open/high/low/close is null (halted trading days) are
/// skipped; a missing volume defaults to zero since no indicator reads it.
fn series_from_chart(ticker: &str, payload: ChartResponse) -> Result<PriceSeries, ProviderError> {
    if let Some(err) = payload.chart.error {
        let code = err.code.unwrap_or_default();
        let description = err.description.unwrap_or_default();
        debug!(ticker, code = %code, "provider reported an error payload");
        if code == "Not Found" {
            return Err(ProviderError::Empty(ticker.to_string()));
        }
        return Err(ProviderError::Decode(format!("{code}: {description}")));
    }

    let result = payload
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| ProviderError::Empty(ticker.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Decode("payload carries no quote block".into()))?;

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let bar = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = bar else {
            debug!(ticker, index = i, "skipping bar with null fields");
            continue;
        };

        let date = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| ProviderError::Decode(format!("timestamp {ts} out of range")))?
            .date_naive();

        points.push(PricePoint {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        });
    }

    if points.is_empty() {
        return Err(ProviderError::Empty(ticker.to_string()));
    }

    Ok(PriceSeries::new(points))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // A trimmed chart payload in the provider's wire shape: three trading
    // days, the middle one halted (null fields).
    const CHART_FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704153600, 1704240000, 1704326400],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, null, 184.22],
                        "high":   [188.44, null, 185.88],
                        "low":    [183.89, null, 183.43],
                        "close":  [185.64, null, 184.25],
                        "volume": [82488700, null, 58414500]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    const NOT_FOUND_FIXTURE: &str = r#"{
        "chart": {
            "result": null,
            "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
        }
    }"#;

    #[test]
    fn decodes_chart_payload_into_series() {
        let payload: ChartResponse = serde_json::from_str(CHART_FIXTURE).unwrap();
        let series = series_from_chart("AAPL", payload).unwrap();

        // The halted middle day is skipped, not zero-filled.
        assert_eq!(series.len(), 2);
        let points = series.points();
        assert_eq!(
            points[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert!((points[0].close - 185.64).abs() < 1e-9);
        assert!((points[0].volume - 82_488_700.0).abs() < 1e-3);
        assert_eq!(
            points[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
        assert!(series.validate().is_ok());
    }

    #[test]
    fn unknown_ticker_maps_to_empty() {
        let payload: ChartResponse = serde_json::from_str(NOT_FOUND_FIXTURE).unwrap();
        assert!(matches!(
            series_from_chart("ZZZZZZ", payload),
            Err(ProviderError::Empty(_))
        ));
    }

    #[test]
    fn all_null_payload_is_empty() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704153600],
                    "indicators": { "quote": [{
                        "open": [null], "high": [null], "low": [null],
                        "close": [null], "volume": [null]
                    }]}
                }],
                "error": null
            }
        }"#;
        let payload: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            series_from_chart("AAPL", payload),
            Err(ProviderError::Empty(_))
        ));
    }

    #[test]
    fn missing_quote_block_is_a_decode_error() {
        let json = r#"{
            "chart": {
                "result": [{ "timestamp": [], "indicators": { "quote": [] } }],
                "error": null
            }
        }"#;
        let payload: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            series_from_chart("AAPL", payload),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn unix_seconds_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(unix_seconds(date), 1_704_153_600);
    }
}
