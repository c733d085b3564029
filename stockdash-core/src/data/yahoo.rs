//! Yahoo Finance data provider.
//!
//! Fetches daily records from Yahoo's v8 chart API. One request per fetch; a
//! failed request is reported to the caller as-is.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV provider is the fallback when Yahoo is unavailable.

use super::provider::{DataProvider, DataSource, FetchError, FetchResult};
use crate::domain::PriceRecord;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Extra column holding the cash dividend paid on a date (0 when none).
pub const DIVIDENDS: &str = "Dividends";
/// Extra column holding the split ratio effective on a date (0 when none).
pub const STOCK_SPLITS: &str = "Stock Splits";

/// Yahoo Finance v8 chart API response.
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
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    events: Option<ChartEvents>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    numerator: f64,
    denominator: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        Self::with_base_url(timeout, user_agent, DEFAULT_BASE_URL)
    }

    /// Point the provider at a different host (mirrors, test servers).
    pub fn with_base_url(
        timeout: Duration,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL. `period2` is midnight of `end`, so `end` itself
    /// is excluded.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = midnight_utc(start);
        let end_ts = midnight_utc(end);
        format!(
            "{}/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true&events=div%7Csplit",
            self.base_url
        )
    }

    /// Parse the chart API response into records.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<PriceRecord>, FetchError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    FetchError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    FetchError::ResponseFormat(format!("{}: {}", err.code, err.description))
                }
            } else {
                FetchError::ResponseFormat("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormat("result array is empty".into()))?;

        // Yahoo omits timestamps when the window holds no trading days.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let gmtoffset = data.meta.as_ref().map_or(0, |m| m.gmtoffset);

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormat("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let (dividends, splits) = event_maps(data.events.unwrap_or_default(), gmtoffset)?;

        let mut records = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = exchange_date(ts, gmtoffset)?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Skip rows where all OHLCV are null (holidays, halted sessions)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            let mut record = PriceRecord::new(
                date,
                open.unwrap_or(f64::NAN),
                high.unwrap_or(f64::NAN),
                low.unwrap_or(f64::NAN),
                close.unwrap_or(f64::NAN),
                volume.unwrap_or(0),
            );
            record.adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten());
            record.extra.insert(
                DIVIDENDS.to_string(),
                dividends.get(&date).copied().unwrap_or(0.0),
            );
            record.extra.insert(
                STOCK_SPLITS.to_string(),
                splits.get(&date).copied().unwrap_or(0.0),
            );

            records.push(record);
        }

        Ok(records)
    }

    fn request(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, FetchError> {
        let url = self.chart_url(symbol, start, end);
        tracing::info!(symbol, %start, %end, "requesting chart data");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let chart: ChartResponse = serde_json::from_str(&body).map_err(|e| {
            FetchError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, FetchError> {
        let records = if start >= end {
            tracing::debug!(symbol, %start, %end, "empty window, skipping request");
            Vec::new()
        } else {
            self.request(symbol, start, end)?
        };

        Ok(FetchResult {
            symbol: symbol.to_string(),
            records,
            source: DataSource::YahooFinance,
        })
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Trading date of a bar in the exchange's own timezone.
fn exchange_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate, FetchError> {
    chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.naive_utc().date())
        .ok_or_else(|| FetchError::ResponseFormat(format!("invalid timestamp: {ts}")))
}

type EventMap = BTreeMap<NaiveDate, f64>;

fn event_maps(events: ChartEvents, gmtoffset: i64) -> Result<(EventMap, EventMap), FetchError> {
    let mut dividends = EventMap::new();
    for event in events.dividends.into_values() {
        *dividends.entry(exchange_date(event.date, gmtoffset)?).or_insert(0.0) += event.amount;
    }

    let mut splits = EventMap::new();
    for event in events.splits.into_values() {
        if event.denominator != 0.0 {
            splits.insert(
                exchange_date(event.date, gmtoffset)?,
                event.numerator / event.denominator,
            );
        }
    }

    Ok((dividends, splits))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(symbol: &str, json: &str) -> Result<Vec<PriceRecord>, FetchError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response(symbol, resp)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC (09:30 New York)
    const THREE_DAYS: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"gmtoffset": -18000, "exchangeTimezoneName": "America/New_York"},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "events": {
                    "dividends": {"1704292200": {"amount": 0.24, "date": 1704292200}}
                },
                "indicators": {
                    "quote": [{
                        "open":   [187.15, null, 182.15],
                        "high":   [188.44, null, 183.09],
                        "low":    [183.89, null, 180.88],
                        "close":  [185.64, null, 181.91],
                        "volume": [82488700, null, 71983600]
                    }],
                    "adjclose": [{"adjclose": [184.94, null, 181.22]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_rows_and_skips_null_rows() {
        let records = parse("AAPL", THREE_DAYS).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(2024, 1, 2));
        assert_eq!(records[1].date, date(2024, 1, 4));
        assert_eq!(records[0].close, 185.64);
        assert_eq!(records[0].volume, 82_488_700);
        assert_eq!(records[1].adj_close, Some(181.22));
    }

    #[test]
    fn event_columns_are_filled() {
        let records = parse("AAPL", THREE_DAYS).unwrap();
        assert!(records
            .iter()
            .all(|r| r.extra.get(DIVIDENDS) == Some(&0.0) && r.extra.get(STOCK_SPLITS) == Some(&0.0)));

        // The dividend above sits on the skipped null row; move it to the last day
        let json = THREE_DAYS.replace(
            r#""1704292200": {"amount": 0.24, "date": 1704292200}"#,
            r#""1704378600": {"amount": 0.24, "date": 1704378600}"#,
        );
        let records = parse("AAPL", &json).unwrap();
        assert_eq!(records[1].extra.get(DIVIDENDS), Some(&0.24));
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let err = parse("ZZZZ", json).unwrap_err();
        assert_eq!(
            err,
            FetchError::SymbolNotFound {
                symbol: "ZZZZ".into()
            }
        );
    }

    #[test]
    fn other_chart_errors_are_format_errors() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        let err = parse("AAPL", json).unwrap_err();
        assert!(matches!(err, FetchError::ResponseFormat(msg) if msg.contains("Bad Request")));
    }

    #[test]
    fn missing_timestamps_is_empty_window() {
        let json = r#"{"chart": {"result": [{"meta": {"gmtoffset": -18000}, "indicators": {"quote": [{}]}}], "error": null}}"#;
        let records = parse("AAPL", json).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn gmtoffset_shifts_trading_date() {
        // 2024-01-02 00:30 UTC is still 2024-01-01 in New York
        let json = r#"{"chart": {"result": [{
            "meta": {"gmtoffset": -18000},
            "timestamp": [1704155400],
            "indicators": {"quote": [{"open": [1.0], "high": [1.0], "low": [1.0], "close": [1.0], "volume": [1]}]}
        }], "error": null}}"#;
        let records = parse("AAPL", json).unwrap();
        assert_eq!(records[0].date, date(2024, 1, 1));
        assert_eq!(records[0].adj_close, None);
    }

    #[test]
    fn chart_url_excludes_end_date() {
        let provider =
            YahooProvider::with_base_url(Duration::from_secs(5), DEFAULT_USER_AGENT, "http://localhost/")
                .unwrap();
        let url = provider.chart_url("AAPL", date(2024, 1, 1), date(2024, 1, 2));
        assert!(url.starts_with("http://localhost/v8/finance/chart/AAPL?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704153600"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn inverted_window_skips_request() {
        // Unroutable base URL: any request would fail
        let provider =
            YahooProvider::with_base_url(Duration::from_millis(10), DEFAULT_USER_AGENT, "http://127.0.0.1:9")
                .unwrap();
        let result = provider.fetch("AAPL", date(2024, 2, 1), date(2024, 1, 1)).unwrap();
        assert!(result.records.is_empty());
        let result = provider.fetch("AAPL", date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.source, DataSource::YahooFinance);
    }
}
