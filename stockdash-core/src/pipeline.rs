//! The dashboard pipeline: selection in, render-ready view out.
//!
//! One run resolves the company through the catalog, fetches the price history
//! through the memoized fetcher, then derives moving averages and the summary.
//! Each stage has its own error type; `DashboardError` wraps them so the
//! presentation layer can show the message in place of results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{CatalogError, CatalogLoad, CatalogLoader, FALLBACK_NAME};
use crate::config::DashboardConfig;
use crate::data::{build_cache, build_provider, DataProvider, FetchError, PriceFetcher, SeriesCache};
use crate::domain::{DateRange, PriceSeries};
use crate::metrics::{compute_moving_averages, summarize, ComputeError, PriceSummary};

/// What the user picked: a display name and a date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub company: String,
    pub range: DateRange,
}

impl Selection {
    pub fn new(company: impl Into<String>, range: DateRange) -> Self {
        Self {
            company: company.into(),
            range,
        }
    }
}

/// Everything the presentation layer draws for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub company: String,
    pub ticker: String,
    pub range: DateRange,
    /// Price history with `MA20` and `MA50` columns.
    pub series: PriceSeries,
    pub summary: PriceSummary,
}

impl DashboardView {
    /// Heading shown above the metric cards, e.g. `Apple (AAPL)`.
    pub fn title(&self) -> String {
        format!("{} ({})", self.company, self.ticker)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardOutcome {
    Ready(DashboardView),
    /// The provider returned no rows for the range.
    NoData {
        company: String,
        ticker: String,
        range: DateRange,
    },
}

impl DashboardOutcome {
    pub fn view(&self) -> Option<&DashboardView> {
        match self {
            Self::Ready(view) => Some(view),
            Self::NoData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl DashboardError {
    /// Pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Fetch(_) => "fetch",
            Self::Compute(_) => "compute",
        }
    }
}

pub struct Dashboard {
    catalog_path: PathBuf,
    loader: CatalogLoader,
    fetcher: PriceFetcher,
}

impl Dashboard {
    pub fn new(catalog_path: impl Into<PathBuf>, fetcher: PriceFetcher) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            loader: CatalogLoader::new(),
            fetcher,
        }
    }

    pub fn with_provider(
        catalog_path: impl Into<PathBuf>,
        provider: Arc<dyn DataProvider>,
        cache: Arc<dyn SeriesCache>,
    ) -> Self {
        Self::new(catalog_path, PriceFetcher::new(provider, cache))
    }

    /// Wire provider and cache from configuration.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let provider = build_provider(&config.provider)?;
        let cache = build_cache(&config.cache);
        tracing::debug!(
            provider = provider.name(),
            cache = ?config.cache.policy,
            catalog = %config.catalog_path.display(),
            "dashboard configured"
        );
        Ok(Self::with_provider(config.catalog_path.clone(), provider, cache))
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// The catalog, loaded once per path.
    pub fn catalog(&self) -> CatalogLoad {
        self.loader.load(&self.catalog_path)
    }

    /// Why the fallback catalog is in use, if it is.
    pub fn catalog_warning(&self) -> Option<CatalogError> {
        self.catalog().error
    }

    pub fn fetcher(&self) -> &PriceFetcher {
        &self.fetcher
    }

    /// First catalog entry over the `lookback_days` ending `today`.
    pub fn default_selection(&self, today: NaiveDate, lookback_days: i64) -> Selection {
        let catalog = self.catalog().catalog;
        let company = catalog.first_name().unwrap_or(FALLBACK_NAME);
        Selection::new(company, DateRange::trailing(today, lookback_days))
    }

    pub fn run(&self, selection: &Selection) -> Result<DashboardOutcome, DashboardError> {
        let catalog = self.catalog().catalog;
        let ticker = catalog.resolve(&selection.company)?.to_string();
        let range = selection.range;

        let series = self.fetcher.load_prices(&ticker, range.start, range.end)?;
        if series.is_empty() {
            tracing::info!(ticker = %ticker, %range, "no price data for range");
            return Ok(DashboardOutcome::NoData {
                company: selection.company.clone(),
                ticker,
                range,
            });
        }

        let augmented = compute_moving_averages(&series);
        let summary = summarize(&augmented)?;

        Ok(DashboardOutcome::Ready(DashboardView {
            company: selection.company.clone(),
            ticker,
            range,
            series: augmented,
            summary,
        }))
    }
}
