//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (Yahoo Finance, CSV
//! files) so the fetcher can swap implementations and tests can mock them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::PriceRecord;

/// Structured error types for price fetches.
///
/// Messages are shown verbatim in both CLI and TUI.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("malformed CSV {}: {message}", path.display())]
    CsvFormat { path: PathBuf, message: String },

    #[error("I/O error reading {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub records: Vec<PriceRecord>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
}

/// Trait for price providers.
///
/// The memo cache sits above this trait; providers don't know about it.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily records for `symbol` with dates in `[start, end)`.
    ///
    /// A window with no trading days yields `Ok` with no records.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, FetchError>;
}
