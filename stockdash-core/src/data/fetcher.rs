//! Memoized price history fetcher.
//!
//! `PriceFetcher` sits between the pipeline and a `DataProvider`. Successful
//! fetches are stored in an injected `SeriesCache` keyed by the exact
//! `(ticker, start, end)` arguments; failures are never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::memo::{CacheStats, MemoCache};
use super::provider::{DataProvider, FetchError};
use crate::domain::PriceSeries;

/// Cache key: the exact arguments of a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchKey {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }
}

/// Fills a cache miss.
pub type FetchFn<'a> = &'a mut dyn FnMut() -> Result<Arc<PriceSeries>, FetchError>;

/// Storage for fetched series.
pub trait SeriesCache: Send + Sync {
    fn get(&self, key: &FetchKey) -> Option<Arc<PriceSeries>>;
    fn insert(&self, key: FetchKey, series: Arc<PriceSeries>);
    /// Cached series for `key`, or the result of `fetch`, stored only on success.
    fn get_or_fetch(&self, key: FetchKey, fetch: FetchFn<'_>) -> Result<Arc<PriceSeries>, FetchError>;
    fn len(&self) -> usize;
    fn clear(&self);
    fn stats(&self) -> CacheStats;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SeriesCache for MemoCache<FetchKey, Arc<PriceSeries>> {
    fn get(&self, key: &FetchKey) -> Option<Arc<PriceSeries>> {
        MemoCache::get(self, key)
    }

    fn insert(&self, key: FetchKey, series: Arc<PriceSeries>) {
        MemoCache::insert(self, key, series)
    }

    fn get_or_fetch(&self, key: FetchKey, fetch: FetchFn<'_>) -> Result<Arc<PriceSeries>, FetchError> {
        self.get_or_try_insert_with(key, fetch)
    }

    fn len(&self) -> usize {
        MemoCache::len(self)
    }

    fn clear(&self) {
        MemoCache::clear(self)
    }

    fn stats(&self) -> CacheStats {
        MemoCache::stats(self)
    }
}

/// Cache that stores nothing; every fetch goes to the provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl SeriesCache for NoCache {
    fn get(&self, _key: &FetchKey) -> Option<Arc<PriceSeries>> {
        None
    }

    fn insert(&self, _key: FetchKey, _series: Arc<PriceSeries>) {}

    fn get_or_fetch(&self, _key: FetchKey, fetch: FetchFn<'_>) -> Result<Arc<PriceSeries>, FetchError> {
        fetch()
    }

    fn len(&self) -> usize {
        0
    }

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

pub struct PriceFetcher {
    provider: Arc<dyn DataProvider>,
    cache: Arc<dyn SeriesCache>,
}

impl PriceFetcher {
    pub fn new(provider: Arc<dyn DataProvider>, cache: Arc<dyn SeriesCache>) -> Self {
        Self { provider, cache }
    }

    /// Fetcher with an unbounded memo table.
    pub fn memoized(provider: Arc<dyn DataProvider>) -> Self {
        Self::new(provider, Arc::new(MemoCache::<FetchKey, Arc<PriceSeries>>::unbounded()))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn cache(&self) -> &dyn SeriesCache {
        self.cache.as_ref()
    }

    /// Daily history for `ticker` with dates in `[start, end)`.
    ///
    /// Returns the cached series when the same arguments were fetched before.
    /// An inverted or empty window gives an empty series, not an error.
    pub fn load_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<PriceSeries>, FetchError> {
        let key = FetchKey::new(ticker, start, end);

        self.cache.get_or_fetch(key, &mut || -> Result<Arc<PriceSeries>, FetchError> {
            tracing::debug!(ticker, %start, %end, provider = self.provider.name(), "price cache miss");

            let result = self.provider.fetch(ticker, start, end).map_err(|e| {
                tracing::warn!(ticker, %start, %end, error = %e, "price fetch failed");
                e
            })?;

            let series = Arc::new(PriceSeries::new(ticker, result.records));
            tracing::info!(
                ticker,
                %start,
                %end,
                rows = series.len(),
                source = ?result.source,
                "fetched price history"
            );
            Ok(series)
        })
    }
}
