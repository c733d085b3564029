//! stockdash core: ticker catalog, price history fetching, moving averages.
//!
//! This crate holds the whole data pipeline behind the dashboard:
//! - Ticker catalog loader (`Name:TICKER` text file, fallback on failure)
//! - Data providers (Yahoo Finance chart API, CSV files) behind one trait
//! - Memoizing fetcher keyed by `(ticker, start, end)` with pluggable eviction
//! - Simple moving averages and period summaries over the close series
//! - The `Dashboard` pipeline that ties the stages together with typed errors
//!
//! Presentation lives in the `stockdash-tui` and `stockdash-cli` crates.

pub mod catalog;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod metrics;
pub mod pipeline;

pub use catalog::{load_catalog, CatalogError, CatalogLoad, CatalogLoader, TickerCatalog};
pub use config::{ConfigError, DashboardConfig};
pub use data::{DataProvider, FetchError, PriceFetcher};
pub use domain::{DateRange, PriceRecord, PriceSeries};
pub use metrics::{compute_moving_averages, format_usd, summarize, ComputeError, PriceSummary};
pub use pipeline::{Dashboard, DashboardError, DashboardOutcome, DashboardView, Selection};
