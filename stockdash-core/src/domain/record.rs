//! PriceRecord: one trading day of market data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daily OHLCV record for a single symbol, as returned by the provider.
///
/// `adj_close` and `extra` carry whatever else the provider supplied
/// (adjusted close, dividends, split ratios, ...). They are passed through
/// untouched and never used in calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adj_close: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, f64>,
}

impl PriceRecord {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            adj_close: None,
            extra: BTreeMap::new(),
        }
    }

    /// Returns true if any OHLC field is NaN (provider gap).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Low <= open/close <= high. Assumed of upstream data, never enforced.
    pub fn is_consistent(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
