//! Offline provider reading one CSV file per symbol.
//!
//! Layout: `{dir}/{SYMBOL}.csv` with a header row. Required columns are
//! `Date, Open, High, Low, Close, Volume` (case-insensitive); `Adj Close` is
//! optional and any other numeric column is carried in `extra`.

use super::provider::{DataProvider, DataSource, FetchError, FetchResult};
use crate::domain::PriceRecord;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub struct CsvProvider {
    dir: PathBuf,
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    adj_close: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &Path) -> Result<Self, FetchError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase().replace('_', " "))
            .collect();

        let find = |name: &str| normalized.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| FetchError::CsvFormat {
                path: path.to_path_buf(),
                message: format!("missing column '{name}'"),
            })
        };

        let date = require("date")?;
        let open = require("open")?;
        let high = require("high")?;
        let low = require("low")?;
        let close = require("close")?;
        let volume = require("volume")?;
        let adj_close = find("adj close").or_else(|| find("adjclose"));

        let known = [Some(date), Some(open), Some(high), Some(low), Some(close), Some(volume), adj_close];
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !known.contains(&Some(*i)))
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            adj_close,
            extra,
        })
    }
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_file(&self, symbol: &str, path: &Path) -> Result<Vec<PriceRecord>, FetchError> {
        if !path.exists() {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let format_err = |message: String| FetchError::CsvFormat {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| FetchError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let headers = reader.headers().map_err(|e| format_err(e.to_string()))?.clone();
        let columns = Columns::from_headers(&headers, path)?;

        let mut records = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row.map_err(|e| format_err(e.to_string()))?;
            // Header is line 1
            let line = line + 2;

            let date_field = row.get(columns.date).unwrap_or("");
            let date = parse_date(date_field)
                .ok_or_else(|| format_err(format!("line {line}: invalid date '{date_field}'")))?;

            let mut record = PriceRecord::new(
                date,
                price_field(&row, columns.open),
                price_field(&row, columns.high),
                price_field(&row, columns.low),
                price_field(&row, columns.close),
                volume_field(&row, columns.volume),
            );
            record.adj_close = columns
                .adj_close
                .and_then(|i| row.get(i))
                .and_then(|v| v.parse().ok());
            for (i, name) in &columns.extra {
                if let Some(value) = row.get(*i).and_then(|v| v.parse::<f64>().ok()) {
                    record.extra.insert(name.clone(), value);
                }
            }

            records.push(record);
        }

        Ok(records)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, FetchError> {
        let path = self.path_for(symbol);
        tracing::info!(symbol, path = %path.display(), %start, %end, "reading CSV history");

        let mut records = self.read_file(symbol, &path)?;
        records.retain(|r| r.date >= start && r.date < end);
        records.sort_by_key(|r| r.date);

        Ok(FetchResult {
            symbol: symbol.to_string(),
            records,
            source: DataSource::CsvImport,
        })
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time (`2024-01-02 00:00:00-05:00`).
fn parse_date(field: &str) -> Option<NaiveDate> {
    let day = field.get(..10).unwrap_or(field);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn price_field(row: &csv::StringRecord, index: usize) -> f64 {
    row.get(index)
        .and_then(|v| v.parse().ok())
        .unwrap_or(f64::NAN)
}

fn volume_field(row: &csv::StringRecord, index: usize) -> u64 {
    row.get(index)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map_or(0, |v| v as u64)
}
